//! Snapshot to signal.
//!
//! Three factors each contribute a value in [-1, 1]:
//!
//! | Factor | Contribution |
//! |--------|--------------|
//! | momentum | % close change over the lookback, scaled and clamped |
//! | indicators | mean of the RSI zone vote and the MACD histogram sign |
//! | sentiment | mean headline score |
//!
//! The weighted mean over the factors that are present becomes the score;
//! confidence is `50 + 50 * score`. Nothing here reads the clock.

use hermes_market_data::indicators::closes;
use hermes_market_data::models::indicator::{latest, MACD, RSI};
use hermes_market_data::{mean_sentiment, Snapshot};
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::signals_model::{Recommendation, Signal, SignalConfig};

const PRICE_DP: u32 = 8;

struct Factor {
    contribution: f64,
    weight: f64,
}

/// Build a [`Signal`] from `snapshot`. Deterministic: identical inputs give
/// identical output, and `generated_at` is the snapshot's own timestamp.
pub fn generate(snapshot: &Snapshot, config: &SignalConfig) -> Signal {
    let mut rationale = Vec::new();
    let mut factors = Vec::with_capacity(3);

    match momentum(snapshot, config) {
        Some(change) => {
            if change.abs() >= config.momentum_threshold_pct {
                let direction = if change > 0.0 { "up" } else { "down" };
                rationale.push(format!(
                    "Price momentum {} {:.2}% over the last {} bars",
                    direction,
                    change.abs(),
                    config.momentum_lookback.min(snapshot.bars.len())
                ));
            }
            factors.push(Factor {
                contribution: (change / config.momentum_scale_pct).clamp(-1.0, 1.0),
                weight: config.weights.momentum,
            });
        }
        None => rationale.push("Price momentum unavailable; excluded from score".to_string()),
    }

    match indicator_bias(snapshot, config, &mut rationale) {
        Some(bias) => factors.push(Factor {
            contribution: bias,
            weight: config.weights.indicators,
        }),
        None => {
            rationale.push("Technical indicators unavailable; excluded from score".to_string())
        }
    }

    let sentiment = if snapshot.availability.news.is_available() {
        mean_sentiment(&snapshot.news).ok_or("No recent headlines; sentiment excluded from score")
    } else {
        Err("News sentiment unavailable; excluded from score")
    };
    match sentiment {
        Ok(mean) => {
            if mean.abs() >= config.sentiment_threshold {
                let tone = if mean > 0.0 { "positive" } else { "negative" };
                rationale.push(format!(
                    "News sentiment {} ({:+.2} across {} headlines)",
                    tone,
                    mean,
                    snapshot.news.len()
                ));
            }
            factors.push(Factor {
                contribution: mean.clamp(-1.0, 1.0),
                weight: config.weights.sentiment,
            });
        }
        Err(note) => rationale.push(note.to_string()),
    }

    let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
    let score = if total_weight > 0.0 {
        factors
            .iter()
            .map(|f| f.contribution * f.weight)
            .sum::<f64>()
            / total_weight
    } else {
        rationale.push("No market data available; holding at neutral confidence".to_string());
        0.0
    };

    let confidence = round2((50.0 + 50.0 * score).clamp(0.0, 100.0));
    let recommendation = if confidence >= config.buy_threshold && score > 0.0 {
        Recommendation::Buy
    } else if confidence <= config.sell_threshold && score < 0.0 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    };

    let entry = snapshot.latest_close();
    let (target, stop) = match entry {
        Some(entry) => levels(entry, recommendation, confidence, config),
        None => (None, None),
    };

    Signal {
        instrument: snapshot.instrument.clone(),
        recommendation,
        confidence,
        entry,
        target,
        stop,
        rationale,
        generated_at: snapshot.as_of,
        sources: snapshot.availability,
        cached: false,
    }
}

/// % change of the close across the trailing lookback window.
fn momentum(snapshot: &Snapshot, config: &SignalConfig) -> Option<f64> {
    let closes = closes(&snapshot.bars);
    let window = &closes[closes.len().saturating_sub(config.momentum_lookback)..];
    let (first, last) = (*window.first()?, *window.last()?);
    if window.len() < 2 || first <= 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

fn indicator_bias(
    snapshot: &Snapshot,
    config: &SignalConfig,
    rationale: &mut Vec<String>,
) -> Option<f64> {
    let mut votes = Vec::with_capacity(2);

    if let Some(rsi) = latest(&snapshot.indicators, RSI).and_then(|r| r.as_scalar()) {
        if rsi < config.rsi_oversold {
            rationale.push(format!(
                "RSI {:.1} below {} (oversold)",
                rsi, config.rsi_oversold
            ));
            votes.push(1.0);
        } else if rsi > config.rsi_overbought {
            rationale.push(format!(
                "RSI {:.1} above {} (overbought)",
                rsi, config.rsi_overbought
            ));
            votes.push(-1.0);
        } else {
            votes.push(0.0);
        }
    }

    if let Some(hist) = latest(&snapshot.indicators, MACD).and_then(|r| r.macd_histogram()) {
        if hist > 0.0 {
            rationale.push(format!("MACD histogram positive ({:+.4}), bullish", hist));
            votes.push(1.0);
        } else if hist < 0.0 {
            rationale.push(format!("MACD histogram negative ({:+.4}), bearish", hist));
            votes.push(-1.0);
        } else {
            votes.push(0.0);
        }
    }

    if votes.is_empty() {
        return None;
    }
    Some(votes.iter().sum::<f64>() / votes.len() as f64)
}

/// Target and stop for a directional call, `None` for HOLD.
fn levels(
    entry: Decimal,
    recommendation: Recommendation,
    confidence: f64,
    config: &SignalConfig,
) -> (Option<Decimal>, Option<Decimal>) {
    let conviction = Decimal::from_f64((confidence - 50.0).abs() / 50.0).unwrap_or_default();
    let scale = config.risk_level.multiplier() * conviction / Decimal::ONE_HUNDRED;
    let up = config.target_pct * scale;
    let down = config.stop_pct * scale;

    let (target, stop) = match recommendation {
        Recommendation::Buy => (entry * (Decimal::ONE + up), entry * (Decimal::ONE - down)),
        Recommendation::Sell => (entry * (Decimal::ONE - up), entry * (Decimal::ONE + down)),
        Recommendation::Hold => return (None, None),
    };
    (Some(round_price(target)), Some(round_price(stop)))
}

fn round_price(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::RiskLevel;
    use chrono::{Duration, TimeZone, Utc};
    use hermes_market_data::{
        Bar, DataSource, IndicatorReading, Instrument, Interval, NewsItem, Sentiment,
        SourceAvailability, Ticker,
    };
    use rust_decimal_macros::dec;

    fn instrument() -> Instrument {
        Instrument::parse("BTCUSDT").unwrap()
    }

    fn bars_from(closes: &[i64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let px = Decimal::from(*c);
                Bar::new(
                    t0 + Duration::hours(i as i64),
                    Interval::OneHour,
                    px,
                    px + dec!(1),
                    px - dec!(1),
                    px,
                    dec!(5),
                )
            })
            .collect()
    }

    fn news(sentiments: &[Sentiment]) -> Vec<NewsItem> {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        sentiments
            .iter()
            .map(|s| NewsItem {
                headline: "headline".to_string(),
                source: "Wire".to_string(),
                url: None,
                published_at: t,
                sentiment: *s,
            })
            .collect()
    }

    fn snapshot(
        bars: Vec<Bar>,
        indicators: Vec<IndicatorReading>,
        news: Vec<NewsItem>,
    ) -> Snapshot {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let source = |present: bool| {
            if present {
                DataSource::Live
            } else {
                DataSource::Unavailable
            }
        };
        Snapshot {
            instrument: instrument(),
            as_of,
            ticker: Ticker::from_bars(&bars),
            availability: SourceAvailability {
                price: source(!bars.is_empty()),
                indicators: source(!indicators.is_empty()),
                news: source(!news.is_empty()),
            },
            bars,
            indicators,
            news,
        }
    }

    fn bullish_indicators() -> Vec<IndicatorReading> {
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap();
        vec![
            IndicatorReading::scalar(instrument(), RSI, as_of, 25.0),
            IndicatorReading::macd(instrument(), as_of, 1.2, 0.8, 0.4),
        ]
    }

    #[test]
    fn test_all_factors_bullish() {
        let rising: Vec<i64> = (0..12).map(|i| 100 + i * 2).collect();
        let snap = snapshot(
            bars_from(&rising),
            bullish_indicators(),
            news(&[Sentiment::Positive, Sentiment::Positive, Sentiment::Neutral]),
        );

        let signal = generate(&snap, &SignalConfig::default());

        assert_eq!(signal.recommendation, Recommendation::Buy);
        assert!(signal.confidence > 90.0);
        assert!(signal.sources.all_live());
        assert_eq!(signal.entry, Some(dec!(122)));
        assert!(signal.target.unwrap() > dec!(122));
        assert!(signal.stop.unwrap() < dec!(122));
        assert_eq!(signal.generated_at, snap.as_of);

        assert!(signal.rationale[0].starts_with("Price momentum up"));
        assert!(signal.rationale.iter().any(|r| r.starts_with("RSI")));
        assert!(signal.rationale.iter().any(|r| r.starts_with("MACD")));
        assert!(signal
            .rationale
            .last()
            .unwrap()
            .starts_with("News sentiment positive"));
    }

    #[test]
    fn test_missing_news_is_excluded() {
        let rising: Vec<i64> = (0..12).map(|i| 100 + i * 2).collect();
        let snap = snapshot(bars_from(&rising), bullish_indicators(), Vec::new());

        let with_news = generate(
            &snapshot(
                bars_from(&rising),
                bullish_indicators(),
                news(&[Sentiment::Negative, Sentiment::Negative]),
            ),
            &SignalConfig::default(),
        );
        let signal = generate(&snap, &SignalConfig::default());

        assert!(signal
            .rationale
            .contains(&"News sentiment unavailable; excluded from score".to_string()));
        assert!(!signal.rationale.iter().any(|r| r.starts_with("News sentiment positive")));
        // Momentum and indicators are both fully bullish here
        assert_eq!(signal.confidence, 100.0);
        assert!(with_news.confidence < signal.confidence);
    }

    #[test]
    fn test_live_news_without_headlines_is_not_unavailable() {
        let rising: Vec<i64> = (0..12).map(|i| 100 + i * 2).collect();
        let mut snap = snapshot(bars_from(&rising), bullish_indicators(), Vec::new());
        snap.availability.news = DataSource::Live;

        let signal = generate(&snap, &SignalConfig::default());

        assert!(signal
            .rationale
            .contains(&"No recent headlines; sentiment excluded from score".to_string()));
        assert!(!signal.rationale.iter().any(|r| r.contains("unavailable")));
        assert_eq!(signal.confidence, 100.0);
        assert!(signal.sources.all_live());
    }

    #[test]
    fn test_empty_snapshot_holds_at_neutral() {
        let signal = generate(&snapshot(vec![], vec![], vec![]), &SignalConfig::default());
        assert_eq!(signal.recommendation, Recommendation::Hold);
        assert_eq!(signal.confidence, 50.0);
        assert_eq!(signal.entry, None);
        assert_eq!(signal.target, None);
        assert_eq!(signal.rationale.len(), 4);
        assert!(signal.rationale[3].starts_with("No market data available"));
    }

    #[test]
    fn test_bearish_sell_levels() {
        let falling: Vec<i64> = (0..12).map(|i| 200 - i * 4).collect();
        let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap();
        let indicators = vec![
            IndicatorReading::scalar(instrument(), RSI, as_of, 82.0),
            IndicatorReading::macd(instrument(), as_of, -1.0, -0.5, -0.5),
        ];
        let snap = snapshot(bars_from(&falling), indicators, news(&[Sentiment::Negative]));

        let signal = generate(&snap, &SignalConfig::default());
        assert_eq!(signal.recommendation, Recommendation::Sell);
        assert_eq!(signal.confidence, 0.0);

        // Full conviction, medium risk: target 5% below, stop 2.5% above
        let entry = signal.entry.unwrap();
        assert_eq!(entry, dec!(156));
        assert_eq!(signal.target, Some(dec!(148.2)));
        assert_eq!(signal.stop, Some(dec!(159.9)));
    }

    #[test]
    fn test_hold_has_no_levels() {
        let flat = vec![100; 12];
        let snap = snapshot(bars_from(&flat), vec![], vec![]);
        let signal = generate(&snap, &SignalConfig::default());

        assert_eq!(signal.recommendation, Recommendation::Hold);
        assert_eq!(signal.confidence, 50.0);
        assert_eq!(signal.entry, Some(dec!(100)));
        assert_eq!(signal.target, None);
        assert_eq!(signal.stop, None);
    }

    #[test]
    fn test_risk_level_widens_levels() {
        let rising: Vec<i64> = (0..12).map(|i| 100 + i * 2).collect();
        let snap = snapshot(bars_from(&rising), bullish_indicators(), vec![]);
        let low = generate(
            &snap,
            &SignalConfig {
                risk_level: RiskLevel::Low,
                ..SignalConfig::default()
            },
        );
        let high = generate(
            &snap,
            &SignalConfig {
                risk_level: RiskLevel::High,
                ..SignalConfig::default()
            },
        );
        assert!(high.target.unwrap() > low.target.unwrap());
        assert!(high.stop.unwrap() < low.stop.unwrap());
    }
}
