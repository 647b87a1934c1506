//! Why a provider adapter could not deliver data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum UnavailableReason {
    /// The local quota for this provider is spent for the current window.
    RateLimited,

    /// The provider did not answer within the aggregator's deadline.
    Timeout,

    /// The provider failed, possibly after retries.
    #[serde(rename_all = "camelCase")]
    Failed { kind: String, message: String },
}

impl From<&MarketDataError> for UnavailableReason {
    fn from(e: &MarketDataError) -> Self {
        match e {
            MarketDataError::RateLimited { .. } => Self::RateLimited,
            MarketDataError::Timeout { .. } => Self::Timeout,
            other => Self::Failed {
                kind: other.kind().to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Timeout => f.write_str("timed out"),
            Self::Failed { kind, .. } => write!(f, "failed ({})", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error() {
        let e = MarketDataError::RateLimited {
            provider: "NEWS_API".to_string(),
        };
        assert_eq!(UnavailableReason::from(&e), UnavailableReason::RateLimited);

        let e = MarketDataError::ServerError {
            provider: "BINANCE".to_string(),
            status: 503,
        };
        let reason = UnavailableReason::from(&e);
        assert_eq!(reason.to_string(), "failed (server_error)");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&UnavailableReason::Timeout).unwrap();
        assert_eq!(json, r#"{"reason":"timeout"}"#);
    }
}
