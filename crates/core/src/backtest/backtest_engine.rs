//! Bar-by-bar replay.
//!
//! For each bar `i` the strategy sees `bars[..=i]`, decides, and the ledger
//! moves between FLAT and OPEN:
//!
//! - FLAT -> OPEN on BUY (long) or SELL (short, when allowed), at the close
//! - OPEN -> FLAT on an opposing call, or on HOLD once the stop or target
//!   recorded at entry is crossed
//! - a position still open after the last bar is closed there
//!
//! The equity curve gets one mark-to-market point per bar.

use hermes_market_data::registry::SeriesViolation;
use hermes_market_data::{Bar, BarValidator, Instrument};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use super::backtest_ledger::{Ledger, OpenPosition};
use super::backtest_metrics::compute_metrics;
use super::backtest_model::{
    BacktestConfig, BacktestResult, EquityPoint, ExitReason, Side,
};
use super::backtest_strategy::{Decision, SignalStrategy, Strategy};
use crate::errors::BacktestInputError;
use crate::signals::Recommendation;

const QUANTITY_DP: u32 = 8;

/// Replay `bars` through the default [`SignalStrategy`].
pub fn run(
    instrument: &Instrument,
    bars: &[Bar],
    config: &BacktestConfig,
    initial_balance: Decimal,
) -> Result<BacktestResult, BacktestInputError> {
    let mut strategy =
        SignalStrategy::new(instrument.clone(), config.signal.clone(), config.lookback_bars);
    run_with_strategy(bars, config, initial_balance, &mut strategy)
}

/// Replay `bars` through `strategy`. Input is validated up front and nothing
/// is simulated if it is rejected.
pub fn run_with_strategy(
    bars: &[Bar],
    config: &BacktestConfig,
    initial_balance: Decimal,
    strategy: &mut dyn Strategy,
) -> Result<BacktestResult, BacktestInputError> {
    validate_input(bars, config, initial_balance)?;

    let mut ledger = Ledger::new(initial_balance);
    let mut equity_curve = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let price = bar.close;
        let decision = strategy.decide(&bars[..=i]);

        if let Some(position) = ledger.position() {
            let exit = match (position.side, decision.recommendation) {
                (Side::Long, Recommendation::Sell) | (Side::Short, Recommendation::Buy) => {
                    Some(ExitReason::Signal)
                }
                (_, Recommendation::Hold) => position.exit_trigger(price),
                _ => None,
            };
            if let Some(reason) = exit {
                ledger.close(price, bar.close_time, reason)?;
            }
        }

        if ledger.position().is_none() {
            let side = match decision.recommendation {
                Recommendation::Buy => Some(Side::Long),
                Recommendation::Sell if config.allow_short => Some(Side::Short),
                _ => None,
            };
            if let Some(side) = side {
                open_position(&mut ledger, bar, side, &decision, config)?;
            }
        }

        equity_curve.push(EquityPoint {
            timestamp: bar.close_time,
            value: ledger.equity(price)?,
        });
    }

    if let Some(last) = bars.last() {
        ledger.close(last.close, last.close_time, ExitReason::ForcedLiquidation)?;
    }

    let (final_balance, trades) = ledger.into_parts();
    let metrics = compute_metrics(
        initial_balance,
        final_balance,
        &trades,
        &equity_curve,
        config.interval,
    );
    debug!(
        "Backtest with {} strategy: {} bars, {} trades, {:.2}% return",
        strategy.name(),
        bars.len(),
        metrics.trade_count,
        metrics.total_return_pct
    );

    Ok(BacktestResult {
        initial_balance,
        final_balance,
        metrics,
        trades,
        equity_curve,
    })
}

fn validate_input(
    bars: &[Bar],
    config: &BacktestConfig,
    initial_balance: Decimal,
) -> Result<(), BacktestInputError> {
    if initial_balance <= Decimal::ZERO {
        return Err(BacktestInputError::InvalidBalance(initial_balance));
    }
    if bars.is_empty() {
        return Err(BacktestInputError::EmptySeries);
    }
    config.validate()?;

    BarValidator::new()
        .validate_series(bars)
        .map_err(|violation| match violation {
            SeriesViolation::NonMonotonic { index } => BacktestInputError::NonMonotonic { index },
            SeriesViolation::InvalidBar { index, message } => {
                BacktestInputError::InvalidBar { index, message }
            }
        })
}

fn open_position(
    ledger: &mut Ledger,
    bar: &Bar,
    side: Side,
    decision: &Decision,
    config: &BacktestConfig,
) -> Result<(), BacktestInputError> {
    let price = bar.close;
    let quantity = position_size(ledger.balance(), price, side, decision.stop, config)?;
    if quantity > Decimal::ZERO {
        ledger.open(OpenPosition {
            side,
            quantity,
            entry_price: price,
            opened_at: bar.close_time,
            stop: decision.stop,
            target: decision.target,
        });
    }
    Ok(())
}

/// Fixed-fractional sizing: the balance share at risk divided by the
/// per-unit risk, capped at what the balance can buy outright.
fn position_size(
    balance: Decimal,
    price: Decimal,
    side: Side,
    stop: Option<Decimal>,
    config: &BacktestConfig,
) -> Result<Decimal, BacktestInputError> {
    if balance <= Decimal::ZERO || price <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let per_unit_risk = match (side, stop) {
        (Side::Long, Some(stop)) if stop < price => price - stop,
        (Side::Short, Some(stop)) if stop > price => stop - price,
        _ => percent_of(price, config.fallback_stop_pct, "fallback stop distance")?,
    };
    if per_unit_risk <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let risk_budget = percent_of(balance, config.risk_per_trade_pct, "risk budget")?;
    let affordable = balance.checked_div(price).unwrap_or(Decimal::ZERO);
    let quantity = risk_budget
        .checked_div(per_unit_risk)
        .unwrap_or(affordable)
        .min(affordable);
    Ok(quantity.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero))
}

fn percent_of(
    value: Decimal,
    pct: Decimal,
    what: &'static str,
) -> Result<Decimal, BacktestInputError> {
    value
        .checked_mul(pct)
        .map(|v| v / Decimal::ONE_HUNDRED)
        .ok_or(BacktestInputError::Overflow(what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hermes_market_data::Interval;
    use rust_decimal_macros::dec;

    struct AlwaysLong;

    impl Strategy for AlwaysLong {
        fn name(&self) -> &str {
            "always-long"
        }

        fn decide(&mut self, _history: &[Bar]) -> Decision {
            Decision::buy()
        }
    }

    /// Plays back a fixed script, one decision per bar.
    struct Scripted(Vec<Decision>);

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn decide(&mut self, history: &[Bar]) -> Decision {
            self.0
                .get(history.len() - 1)
                .cloned()
                .unwrap_or_else(Decision::hold)
        }
    }

    fn bars(closes: &[Decimal]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Bar::new(
                    t0 + Duration::days(i as i64),
                    Interval::OneDay,
                    *c,
                    *c,
                    *c,
                    *c,
                    dec!(1),
                )
            })
            .collect()
    }

    #[test]
    fn test_rising_series_always_long() {
        let closes: Vec<Decimal> = (0..20).map(|i| Decimal::from(100 + i)).collect();
        let series = bars(&closes);

        let result =
            run_with_strategy(&series, &BacktestConfig::default(), dec!(10000), &mut AlwaysLong)
                .unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.metrics.trade_count, 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::ForcedLiquidation);
        assert_eq!(trade.entry_price, dec!(100));
        assert_eq!(trade.exit_price, dec!(119));
        // 2% of 10000 risked at 2 per unit -> 100 units, the affordable cap
        assert_eq!(trade.quantity, dec!(100));
        assert_eq!(result.final_balance, dec!(11900));
        assert!(result.metrics.total_return_pct > 0.0);
        assert_eq!(result.metrics.max_drawdown_pct, 0.0);
        assert_eq!(result.metrics.win_rate_pct, 100.0);
        assert_eq!(result.equity_curve.len(), series.len());
        assert_eq!(result.equity_curve.last().unwrap().value, result.final_balance);
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = run_with_strategy(&[], &BacktestConfig::default(), dec!(1000), &mut AlwaysLong)
            .unwrap_err();
        assert_eq!(err, BacktestInputError::EmptySeries);
    }

    #[test]
    fn test_bad_balance_rejected() {
        let series = bars(&[dec!(10), dec!(11)]);
        let err = run_with_strategy(&series, &BacktestConfig::default(), dec!(0), &mut AlwaysLong)
            .unwrap_err();
        assert_eq!(err, BacktestInputError::InvalidBalance(dec!(0)));
    }

    #[test]
    fn test_out_of_order_series_rejected() {
        let mut series = bars(&[dec!(10), dec!(11), dec!(12)]);
        series.swap(1, 2);
        let err = run_with_strategy(&series, &BacktestConfig::default(), dec!(1000), &mut AlwaysLong)
            .unwrap_err();
        assert_eq!(err, BacktestInputError::NonMonotonic { index: 2 });
    }

    #[test]
    fn test_broken_bar_rejected() {
        let mut series = bars(&[dec!(10), dec!(11)]);
        series[1].high = dec!(5);
        let err = run_with_strategy(&series, &BacktestConfig::default(), dec!(1000), &mut AlwaysLong)
            .unwrap_err();
        assert!(matches!(err, BacktestInputError::InvalidBar { index: 1, .. }));
    }

    #[test]
    fn test_opposing_signal_and_stop_exits() {
        let series = bars(&[
            dec!(100),
            dec!(104),
            dec!(110),
            dec!(100),
            dec!(96),
            dec!(97),
        ]);
        let mut script = Scripted(vec![
            Decision {
                recommendation: Recommendation::Buy,
                stop: Some(dec!(95)),
                target: Some(dec!(120)),
            },
            Decision::hold(),
            Decision::sell(),
            Decision {
                recommendation: Recommendation::Buy,
                stop: Some(dec!(97)),
                target: None,
            },
            Decision::hold(),
            Decision::hold(),
        ]);

        let result =
            run_with_strategy(&series, &BacktestConfig::default(), dec!(1000), &mut script)
                .unwrap();

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].exit_reason, ExitReason::Signal);
        assert_eq!(result.trades[0].exit_price, dec!(110));
        assert_eq!(result.trades[1].exit_reason, ExitReason::StopLoss);
        assert_eq!(result.trades[1].exit_price, dec!(96));
        assert!(result.trades[1].pnl < Decimal::ZERO);
        assert_eq!(result.metrics.win_rate_pct, 50.0);
    }

    #[test]
    fn test_short_only_when_allowed() {
        let series = bars(&[dec!(100), dec!(90), dec!(80)]);

        let flat = run_with_strategy(
            &series,
            &BacktestConfig::default(),
            dec!(1000),
            &mut Scripted(vec![Decision::sell()]),
        )
        .unwrap();
        assert!(flat.trades.is_empty());
        assert_eq!(flat.metrics.win_rate_pct, 0.0);
        assert_eq!(flat.final_balance, dec!(1000));

        let config = BacktestConfig {
            allow_short: true,
            ..BacktestConfig::default()
        };
        let short = run_with_strategy(
            &series,
            &config,
            dec!(1000),
            &mut Scripted(vec![Decision::sell()]),
        )
        .unwrap();
        assert_eq!(short.trades.len(), 1);
        assert_eq!(short.trades[0].side, Side::Short);
        assert!(short.final_balance > dec!(1000));
    }

    #[test]
    fn test_input_is_not_mutated_and_runs_repeat() {
        let closes: Vec<Decimal> = (0..40)
            .map(|i| Decimal::from(100 + (i % 7) * 3 - (i % 5) * 2))
            .collect();
        let series = bars(&closes);
        let before = series.clone();
        let instrument = Instrument::parse("BTCUSDT").unwrap();

        let a = run(&instrument, &series, &BacktestConfig::default(), dec!(5000)).unwrap();
        let b = run(&instrument, &series, &BacktestConfig::default(), dec!(5000)).unwrap();

        assert_eq!(a, b);
        assert_eq!(series, before);
    }

    #[test]
    fn test_position_size_rounds_down() {
        let config = BacktestConfig::default();
        // 2% of 1000 = 20 risked, 3 per unit -> 6.666... units
        let qty = position_size(dec!(1000), dec!(30), Side::Long, Some(dec!(27)), &config).unwrap();
        assert_eq!(qty, dec!(6.66666666));
        // Stop on the wrong side falls back to 2% of price
        let qty = position_size(dec!(1000), dec!(50), Side::Long, Some(dec!(60)), &config).unwrap();
        assert_eq!(qty, dec!(20));
    }

    #[test]
    fn test_extreme_balance_reports_overflow() {
        let series = bars(&[dec!(1), dec!(2), dec!(3)]);

        let err = run_with_strategy(&series, &BacktestConfig::default(), Decimal::MAX, &mut AlwaysLong)
            .unwrap_err();

        assert_eq!(err, BacktestInputError::Overflow("risk budget"));
    }
}
