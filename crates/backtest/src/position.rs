//! Position and round-trip trade tracking.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Open position. Long-only: size is zero or positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    /// Units held.
    pub size: f64,
    /// Size-weighted average entry price; zero when flat.
    pub avg_price: f64,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.size <= 0.0
    }

    /// Add `size` units bought at `price`.
    pub fn add(&mut self, price: f64, size: f64) {
        let new_size = self.size + size;
        self.avg_price = (self.avg_price * self.size + price * size) / new_size;
        self.size = new_size;
    }

    /// Remove `size` units. Callers guarantee `size <= self.size`.
    pub fn reduce(&mut self, size: f64) {
        self.size -= size;
        if self.size <= 1e-12 {
            self.size = 0.0;
            self.avg_price = 0.0;
        }
    }

    /// Mark-to-market value at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.size * price
    }
}

/// A completed buy-then-sell round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub entry_ts: NaiveDateTime,
    pub exit_ts: NaiveDateTime,
    pub entry_bar: usize,
    pub exit_bar: usize,
    /// Average entry price.
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    /// Entry and exit commission attributed to this trade.
    pub commission: f64,
    /// Net P&L after commission.
    pub pnl: f64,
}

impl ClosedTrade {
    /// Number of bars between entry and exit fills.
    pub fn bars_held(&self) -> usize {
        self.exit_bar - self.entry_bar
    }
}

/// Open lot being accumulated by buys.
#[derive(Debug, Clone)]
struct OpenLot {
    entry_ts: NaiveDateTime,
    entry_bar: usize,
    size: f64,
    cost: f64,
    commission: f64,
}

/// Builds round-trip trades from completed fills.
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    open: Option<OpenLot>,
    trades: Vec<ClosedTrade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed buy.
    pub fn record_buy(
        &mut self,
        ts: NaiveDateTime,
        bar: usize,
        price: f64,
        size: f64,
        commission: f64,
    ) {
        let lot = self.open.get_or_insert(OpenLot {
            entry_ts: ts,
            entry_bar: bar,
            size: 0.0,
            cost: 0.0,
            commission: 0.0,
        });
        lot.size += size;
        lot.cost += price * size;
        lot.commission += commission;
    }

    /// Record a completed sell, closing all or part of the open lot.
    pub fn record_sell(
        &mut self,
        ts: NaiveDateTime,
        bar: usize,
        price: f64,
        size: f64,
        commission: f64,
    ) -> Option<ClosedTrade> {
        let lot = self.open.as_mut()?;
        let fraction = (size / lot.size).min(1.0);

        // Pro-rate entry cost and commission
        let entry_cost = lot.cost * fraction;
        let entry_commission = lot.commission * fraction;
        let entry_price = lot.cost / lot.size;
        let pnl = price * size - entry_cost - entry_commission - commission;

        let trade = ClosedTrade {
            entry_ts: lot.entry_ts,
            exit_ts: ts,
            entry_bar: lot.entry_bar,
            exit_bar: bar,
            entry_price,
            exit_price: price,
            size,
            commission: entry_commission + commission,
            pnl,
        };

        lot.size -= size;
        lot.cost -= entry_cost;
        lot.commission -= entry_commission;
        if lot.size <= 1e-12 {
            self.open = None;
        }

        self.trades.push(trade.clone());
        Some(trade)
    }

    pub fn has_open_lot(&self) -> bool {
        self.open.is_some()
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<ClosedTrade> {
        self.trades
    }
}
