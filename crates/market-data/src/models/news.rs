use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lexical headline sentiment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Sentiment {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn score(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }
}

impl From<Sentiment> for i8 {
    fn from(s: Sentiment) -> Self {
        s.score()
    }
}

impl TryFrom<i8> for Sentiment {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Negative),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Positive),
            other => Err(format!("sentiment must be -1, 0 or 1, got {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub sentiment: Sentiment,
}

/// Arithmetic mean of the item scores, `None` for an empty slice.
pub fn mean_sentiment(items: &[NewsItem]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let total: i64 = items.iter().map(|n| i64::from(n.sentiment.score())).sum();
    Some(total as f64 / items.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sentiment: Sentiment) -> NewsItem {
        NewsItem {
            headline: "headline".to_string(),
            source: "wire".to_string(),
            url: None,
            published_at: Utc::now(),
            sentiment,
        }
    }

    #[test]
    fn test_sentiment_serializes_as_integer() {
        let json = serde_json::to_string(&item(Sentiment::Negative)).unwrap();
        assert!(json.contains("\"sentiment\":-1"));
        assert!(!json.contains("url"));
        assert!(serde_json::from_str::<Sentiment>("2").is_err());
    }

    #[test]
    fn test_mean_sentiment() {
        assert_eq!(mean_sentiment(&[]), None);
        let items = vec![
            item(Sentiment::Positive),
            item(Sentiment::Positive),
            item(Sentiment::Negative),
            item(Sentiment::Neutral),
        ];
        assert_eq!(mean_sentiment(&items), Some(0.25));
    }
}
