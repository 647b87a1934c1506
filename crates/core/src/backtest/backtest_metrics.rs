//! Summary statistics over a finished run.

use hermes_market_data::Interval;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::backtest_model::{BacktestMetrics, EquityPoint, Trade};

const EPSILON: f64 = 1e-12;

pub fn compute_metrics(
    initial_balance: Decimal,
    final_balance: Decimal,
    trades: &[Trade],
    equity_curve: &[EquityPoint],
    interval: Interval,
) -> BacktestMetrics {
    let initial = initial_balance.to_f64().unwrap_or(0.0);
    let mut values = Vec::with_capacity(equity_curve.len() + 1);
    values.push(initial);
    values.extend(equity_curve.iter().map(|p| p.value.to_f64().unwrap_or(0.0)));

    BacktestMetrics {
        total_return_pct: total_return_pct(initial_balance, final_balance),
        win_rate_pct: win_rate_pct(trades),
        max_drawdown_pct: max_drawdown_pct(&values),
        sharpe_ratio: sharpe_ratio(&values, interval.periods_per_year()),
        trade_count: trades.len(),
    }
}

fn total_return_pct(initial: Decimal, last: Decimal) -> f64 {
    if initial.is_zero() {
        return 0.0;
    }
    ((last / initial - Decimal::ONE) * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}

fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.pnl > Decimal::ZERO).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Largest decline from a running peak, in percent of that peak.
fn max_drawdown_pct(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd: f64 = 0.0;
    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > EPSILON {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd * 100.0
}

/// Mean over sample standard deviation of per-bar returns, scaled by
/// `sqrt(periods_per_year)`. Zero for flat or too-short curves.
fn sharpe_ratio(values: &[f64], periods_per_year: f64) -> f64 {
    let returns: Vec<f64> = values
        .windows(2)
        .map(|w| if w[0].abs() > EPSILON { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev < EPSILON {
        return 0.0;
    }

    mean / std_dev * periods_per_year.sqrt()
}
