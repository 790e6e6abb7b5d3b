//! Mark-to-market portfolio valuation.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Portfolio value: cash plus the position marked at `close`.
#[inline]
pub fn portfolio_value(cash: f64, position_size: f64, close: f64) -> f64 {
    cash + position_size * close
}

/// Portfolio breakdown at one price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub position_value: f64,
    pub total_value: f64,
}

impl PortfolioSnapshot {
    pub fn new(cash: f64, position_size: f64, close: f64) -> Self {
        let position_value = position_size * close;
        Self {
            cash,
            position_value,
            total_value: cash + position_value,
        }
    }
}

/// Equity curve point, one per bar.
#[derive(Debug, Clone, Serialize)]
pub struct EquityPoint {
    pub ts: NaiveDateTime,
    pub equity: f64,
    pub drawdown: f64,
    pub drawdown_pct: f64,
}

/// Start/end values and profit of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitSummary {
    pub start_value: f64,
    pub end_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
}

impl ProfitSummary {
    /// `start_value` is positive by configuration validation.
    pub fn new(start_value: f64, end_value: f64) -> Self {
        let profit = end_value - start_value;
        Self {
            start_value,
            end_value,
            profit,
            profit_pct: profit / start_value * 100.0,
        }
    }
}

/// Tracks portfolio value over a run.
#[derive(Debug, Clone)]
pub struct PortfolioTracker {
    start_value: f64,
    current: PortfolioSnapshot,
    peak: f64,
    curve: Vec<EquityPoint>,
}

impl PortfolioTracker {
    /// Start a run with no position.
    pub fn new(starting_cash: f64) -> Self {
        let start = PortfolioSnapshot::new(starting_cash, 0.0, 0.0);
        Self {
            start_value: start.total_value,
            current: start,
            peak: start.total_value,
            curve: Vec::new(),
        }
    }

    /// Mark the portfolio at a bar close.
    pub fn mark(&mut self, ts: NaiveDateTime, cash: f64, position_size: f64, close: f64) {
        self.current = PortfolioSnapshot::new(cash, position_size, close);
        let equity = self.current.total_value;
        self.peak = self.peak.max(equity);

        let drawdown = self.peak - equity;
        let drawdown_pct = if self.peak > 0.0 {
            (drawdown / self.peak) * 100.0
        } else {
            0.0
        };
        self.curve.push(EquityPoint {
            ts,
            equity,
            drawdown,
            drawdown_pct,
        });
    }

    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    pub fn current(&self) -> PortfolioSnapshot {
        self.current
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.curve
    }

    pub fn summary(&self) -> ProfitSummary {
        ProfitSummary::new(self.start_value, self.current.total_value)
    }

    pub fn into_equity_curve(self) -> Vec<EquityPoint> {
        self.curve
    }
}
