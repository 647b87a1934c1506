//! Lexical headline sentiment.
//!
//! A headline is positive if it contains any positive keyword, otherwise
//! negative if it contains any negative keyword, otherwise neutral. Word
//! lists are configurable; the defaults are heuristics.

use crate::models::Sentiment;

pub const DEFAULT_POSITIVE: &[&str] = &[
    "gain", "beat", "rise", "surge", "bull", "upgrade", "strong", "record", "rally",
];

pub const DEFAULT_NEGATIVE: &[&str] = &[
    "drop", "miss", "fall", "bear", "decline", "downgrade", "weak", "loss", "plunge",
];

#[derive(Clone, Debug)]
pub struct SentimentScorer {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE, DEFAULT_NEGATIVE)
    }
}

impl SentimentScorer {
    pub fn new<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        let normalize =
            |words: &[S]| words.iter().map(|w| w.as_ref().to_lowercase()).collect::<Vec<_>>();
        Self {
            positive: normalize(positive),
            negative: normalize(negative),
        }
    }

    pub fn score(&self, headline: &str) -> Sentiment {
        let text = headline.to_lowercase();
        if self.positive.iter().any(|w| text.contains(w.as_str())) {
            Sentiment::Positive
        } else if self.negative.iter().any(|w| text.contains(w.as_str())) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring() {
        let scorer = SentimentScorer::default();
        assert_eq!(
            scorer.score("BTCUSDT shows strong momentum in today's trading session"),
            Sentiment::Positive
        );
        assert_eq!(
            scorer.score("Shares DROP after earnings miss"),
            Sentiment::Negative
        );
        assert_eq!(
            scorer.score("Market volatility affects trading volume"),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_positive_wins_ties() {
        let scorer = SentimentScorer::default();
        assert_eq!(
            scorer.score("Stocks rise despite bear market fears"),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_custom_word_lists() {
        let scorer = SentimentScorer::new(&["moon"], &["rug"]);
        assert_eq!(scorer.score("Token goes to the MOON"), Sentiment::Positive);
        assert_eq!(scorer.score("Another rug pull"), Sentiment::Negative);
        assert_eq!(scorer.score("Strong gains"), Sentiment::Neutral);
    }
}
