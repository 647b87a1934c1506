use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instrument::Instrument;

pub const RSI: &str = "RSI";
pub const MACD: &str = "MACD";

/// Value of a single indicator observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IndicatorValue {
    Scalar {
        value: f64,
    },
    #[serde(rename_all = "camelCase")]
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

/// A computed technical indicator, keyed by (instrument, name, as-of).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorReading {
    pub instrument: Instrument,
    pub name: String,
    pub as_of: DateTime<Utc>,
    pub value: IndicatorValue,
}

impl IndicatorReading {
    pub fn scalar(
        instrument: Instrument,
        name: impl Into<String>,
        as_of: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self {
            instrument,
            name: name.into(),
            as_of,
            value: IndicatorValue::Scalar { value },
        }
    }

    pub fn macd(
        instrument: Instrument,
        as_of: DateTime<Utc>,
        line: f64,
        signal: f64,
        histogram: f64,
    ) -> Self {
        Self {
            instrument,
            name: MACD.to_string(),
            as_of,
            value: IndicatorValue::Macd {
                line,
                signal,
                histogram,
            },
        }
    }

    /// The scalar value, if this reading holds one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Scalar { value } => Some(value),
            IndicatorValue::Macd { .. } => None,
        }
    }

    pub fn macd_histogram(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Macd { histogram, .. } => Some(histogram),
            IndicatorValue::Scalar { .. } => None,
        }
    }
}

/// Most recent reading named `name`, if any.
pub fn latest<'a>(readings: &'a [IndicatorReading], name: &str) -> Option<&'a IndicatorReading> {
    readings
        .iter()
        .filter(|r| r.name.eq_ignore_ascii_case(name))
        .max_by_key(|r| r.as_of)
}
