//! Single-position trade ledger: an append-only list of closed trades and
//! at most one open position.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use super::backtest_model::{ExitReason, Side, Trade};
use crate::errors::BacktestInputError;

type LedgerResult<T> = Result<T, BacktestInputError>;

#[derive(Clone, Debug, PartialEq)]
pub struct OpenPosition {
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub stop: Option<Decimal>,
    pub target: Option<Decimal>,
}

impl OpenPosition {
    pub fn unrealized(&self, price: Decimal) -> LedgerResult<Decimal> {
        price
            .checked_sub(self.entry_price)
            .and_then(|change| change.checked_mul(self.quantity))
            .and_then(|pnl| pnl.checked_mul(self.side.sign()))
            .ok_or(BacktestInputError::Overflow("position P&L"))
    }

    /// Stop or target crossed by `price`. The stop wins if both are.
    pub fn exit_trigger(&self, price: Decimal) -> Option<ExitReason> {
        let (stop_hit, target_hit) = match self.side {
            Side::Long => (
                self.stop.is_some_and(|s| price <= s),
                self.target.is_some_and(|t| price >= t),
            ),
            Side::Short => (
                self.stop.is_some_and(|s| price >= s),
                self.target.is_some_and(|t| price <= t),
            ),
        };
        if stop_hit {
            Some(ExitReason::StopLoss)
        } else if target_hit {
            Some(ExitReason::Target)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct Ledger {
    balance: Decimal,
    trades: Vec<Trade>,
    open: Option<OpenPosition>,
}

impl Ledger {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            trades: Vec::new(),
            open: None,
        }
    }

    /// Realized balance.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.open.as_ref()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Balance plus unrealized P&L at `price`.
    pub fn equity(&self, price: Decimal) -> LedgerResult<Decimal> {
        let unrealized = match &self.open {
            Some(position) => position.unrealized(price)?,
            None => Decimal::ZERO,
        };
        self.balance
            .checked_add(unrealized)
            .ok_or(BacktestInputError::Overflow("equity"))
    }

    /// Opens `position` if flat. Returns false when a position is already open.
    pub fn open(&mut self, position: OpenPosition) -> bool {
        if self.open.is_some() {
            return false;
        }
        self.open = Some(position);
        true
    }

    /// Closes the open position at `price`, books the P&L and returns the trade.
    /// On overflow the position stays open and nothing is booked.
    pub fn close(
        &mut self,
        price: Decimal,
        at: DateTime<Utc>,
        reason: ExitReason,
    ) -> LedgerResult<Option<&Trade>> {
        let Some(position) = self.open.as_ref() else {
            return Ok(None);
        };
        let pnl = position.unrealized(price)?;
        let notional = position
            .entry_price
            .checked_mul(position.quantity)
            .ok_or(BacktestInputError::Overflow("position notional"))?;
        let return_pct = if notional.is_zero() {
            Decimal::ZERO
        } else {
            pnl.checked_div(notional)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or(BacktestInputError::Overflow("trade return"))?
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        };
        let balance = self
            .balance
            .checked_add(pnl)
            .ok_or(BacktestInputError::Overflow("balance"))?;

        let Some(position) = self.open.take() else {
            return Ok(None);
        };
        self.balance = balance;
        self.trades.push(Trade {
            opened_at: position.opened_at,
            closed_at: at,
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: price,
            pnl,
            return_pct,
            exit_reason: reason,
        });
        Ok(self.trades.last())
    }

    pub fn into_parts(self) -> (Decimal, Vec<Trade>) {
        (self.balance, self.trades)
    }
}
