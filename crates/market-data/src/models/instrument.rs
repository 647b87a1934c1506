use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Longest symbol accepted by [`Instrument::parse`].
pub const MAX_SYMBOL_LEN: usize = 20;

/// Returned when a symbol cannot name an instrument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid instrument {symbol:?}: {reason}")]
pub struct InvalidInstrument {
    pub symbol: String,
    pub reason: &'static str,
}

/// A tradable symbol such as `BTCUSDT` or `AAPL`.
///
/// Always trimmed and upper-cased, so `btcusdt` and ` BTCUSDT ` name the same
/// instrument. Cheap to clone.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Instrument(Arc<str>);

impl Instrument {
    pub fn parse(raw: &str) -> Result<Self, InvalidInstrument> {
        let symbol = raw.trim().to_ascii_uppercase();
        let invalid = |reason| InvalidInstrument {
            symbol: raw.to_string(),
            reason,
        };

        if symbol.is_empty() {
            return Err(invalid("symbol is empty"));
        }
        if symbol.len() > MAX_SYMBOL_LEN {
            return Err(invalid("symbol is too long"));
        }
        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        {
            return Err(invalid("symbol contains unsupported characters"));
        }
        if !symbol.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("symbol has no letters or digits"));
        }

        Ok(Self(Arc::from(symbol)))
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Instrument {
    type Err = InvalidInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Instrument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Instrument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
