use chrono::{DateTime, Utc};

use super::bar::Interval;

/// Default number of bars in a snapshot window.
pub const DEFAULT_LIMIT: usize = 100;

/// Request parameters passed down to providers.
///
/// `start`/`end` bound the window when set; otherwise providers return the
/// most recent `limit` records.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub interval: Interval,
    pub limit: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            limit: DEFAULT_LIMIT,
            start: None,
            end: None,
        }
    }
}

impl FetchParams {
    pub fn recent(interval: Interval, limit: usize) -> Self {
        Self {
            interval,
            limit,
            start: None,
            end: None,
        }
    }

    /// Bars between `start` and `end`. `limit` is sized to cover the range.
    pub fn range(interval: Interval, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let span = (end - start).num_minutes().max(0);
        let limit = (span / interval.minutes()) as usize + 1;
        Self {
            interval,
            limit,
            start: Some(start),
            end: Some(end),
        }
    }

    /// Stable fragment used to build cache keys.
    pub fn cache_fragment(&self) -> String {
        let ts = |t: Option<DateTime<Utc>>| t.map_or_else(|| "-".to_string(), |t| t.timestamp().to_string());
        format!(
            "{}:{}:{}:{}",
            self.interval,
            self.limit,
            ts(self.start),
            ts(self.end)
        )
    }
}
