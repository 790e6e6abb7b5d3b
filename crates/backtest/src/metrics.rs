//! Backtest performance metrics.
//!
//! Calculates trade statistics from closed round trips and risk figures
//! from the per-bar equity curve.

use crate::portfolio::EquityPoint;
use crate::position::ClosedTrade;
use ordered_float::OrderedFloat;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Backtest performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BacktestMetrics {
    /// Total number of round trips.
    pub total_trades: u32,
    /// Number of winning trades.
    pub winning_trades: u32,
    /// Number of losing trades.
    pub losing_trades: u32,
    /// Win rate (0-1).
    pub win_rate: f64,
    /// Net P&L of closed trades (after commission).
    pub net_pnl: f64,
    /// Commission paid on closed trades.
    pub total_commission: f64,
    /// Average winning trade P&L.
    pub avg_win: f64,
    /// Average losing trade P&L.
    pub avg_loss: f64,
    /// Profit factor (gross wins / gross losses).
    pub profit_factor: f64,
    /// Largest winning trade.
    pub largest_win: f64,
    /// Largest losing trade.
    pub largest_loss: f64,
    /// Average holding period in bars.
    pub avg_bars_held: f64,
    /// Consecutive wins (max).
    pub max_consecutive_wins: u32,
    /// Consecutive losses (max).
    pub max_consecutive_losses: u32,
    /// Maximum drawdown of the equity curve (absolute).
    pub max_drawdown: f64,
    /// Maximum drawdown percentage.
    pub max_drawdown_pct: f64,
    /// Mean over standard deviation of per-bar returns (not annualized).
    pub sharpe_ratio: f64,
}

/// Metrics calculator.
pub struct MetricsCalculator {
    initial_capital: f64,
}

impl MetricsCalculator {
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    /// Calculate metrics from closed trades and the equity curve.
    pub fn calculate(&self, trades: &[ClosedTrade], curve: &[EquityPoint]) -> BacktestMetrics {
        let mut metrics = BacktestMetrics::default();
        self.trade_stats(trades, &mut metrics);

        if let Some(worst) = curve.iter().max_by_key(|p| OrderedFloat(p.drawdown)) {
            metrics.max_drawdown = worst.drawdown;
            metrics.max_drawdown_pct = worst.drawdown_pct;
        }
        metrics.sharpe_ratio = self.sharpe(curve);

        metrics
    }

    fn trade_stats(&self, trades: &[ClosedTrade], metrics: &mut BacktestMetrics) {
        if trades.is_empty() {
            return;
        }
        metrics.total_trades = trades.len() as u32;

        let mut gross_wins = 0.0;
        let mut gross_losses = 0.0;
        let mut total_bars = 0usize;
        let mut current_wins = 0u32;
        let mut current_losses = 0u32;

        for trade in trades {
            metrics.net_pnl += trade.pnl;
            metrics.total_commission += trade.commission;
            total_bars += trade.bars_held();

            if trade.pnl > 0.0 {
                metrics.winning_trades += 1;
                gross_wins += trade.pnl;
                current_wins += 1;
                current_losses = 0;
                metrics.max_consecutive_wins = metrics.max_consecutive_wins.max(current_wins);
            } else {
                metrics.losing_trades += 1;
                gross_losses += trade.pnl.abs();
                current_losses += 1;
                current_wins = 0;
                metrics.max_consecutive_losses = metrics.max_consecutive_losses.max(current_losses);
            }
        }

        let best = trades.iter().map(|t| OrderedFloat(t.pnl)).max();
        let worst = trades.iter().map(|t| OrderedFloat(t.pnl)).min();
        metrics.largest_win = best.map_or(0.0, |p| p.0.max(0.0));
        metrics.largest_loss = worst.map_or(0.0, |p| p.0.min(0.0));

        metrics.win_rate = metrics.winning_trades as f64 / metrics.total_trades as f64;
        metrics.avg_win = if metrics.winning_trades > 0 {
            gross_wins / metrics.winning_trades as f64
        } else {
            0.0
        };
        metrics.avg_loss = if metrics.losing_trades > 0 {
            -gross_losses / metrics.losing_trades as f64
        } else {
            0.0
        };
        metrics.profit_factor = if gross_losses > 0.0 {
            gross_wins / gross_losses
        } else if gross_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        metrics.avg_bars_held = total_bars as f64 / metrics.total_trades as f64;
    }

    /// Per-bar return Sharpe ratio, starting from the initial capital.
    fn sharpe(&self, curve: &[EquityPoint]) -> f64 {
        if curve.len() < 2 {
            return 0.0;
        }

        let mut prev = self.initial_capital;
        let returns: Vec<f64> = curve
            .iter()
            .map(|p| {
                let r = if prev > 0.0 { p.equity / prev - 1.0 } else { 0.0 };
                prev = p.equity;
                r
            })
            .collect();

        let mean = returns.iter().mean();
        let std_dev = returns.iter().std_dev();
        if std_dev.is_finite() && std_dev > 0.0 {
            mean / std_dev
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(bar: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(bar)
    }

    fn make_trade(pnl: f64, commission: f64, bars: usize) -> ClosedTrade {
        ClosedTrade {
            entry_ts: ts(0),
            exit_ts: ts(bars as i64),
            entry_bar: 0,
            exit_bar: bars,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            size: 1.0,
            commission,
            pnl,
        }
    }

    fn make_point(bar: i64, equity: f64, drawdown: f64, drawdown_pct: f64) -> EquityPoint {
        EquityPoint {
            ts: ts(bar),
            equity,
            drawdown,
            drawdown_pct,
        }
    }

    #[test]
    fn test_basic_metrics() {
        let calculator = MetricsCalculator::new(100.0);
        let trades = vec![
            make_trade(10.0, 1.0, 2),  // Win
            make_trade(-5.0, 1.0, 4),  // Loss
            make_trade(7.5, 1.0, 6),   // Win
        ];

        let metrics = calculator.calculate(&trades, &[]);

        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
        assert_relative_eq!(metrics.win_rate, 2.0 / 3.0);
        assert_relative_eq!(metrics.net_pnl, 12.5);
        assert_relative_eq!(metrics.total_commission, 3.0);
        assert_relative_eq!(metrics.avg_win, 8.75);
        assert_relative_eq!(metrics.avg_loss, -5.0);
        assert_relative_eq!(metrics.profit_factor, 3.5);
        assert_relative_eq!(metrics.largest_win, 10.0);
        assert_relative_eq!(metrics.largest_loss, -5.0);
        assert_relative_eq!(metrics.avg_bars_held, 4.0);
    }

    #[test]
    fn test_empty() {
        let metrics = MetricsCalculator::new(100.0).calculate(&[], &[]);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.net_pnl, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn test_consecutive_wins_losses() {
        let trades = vec![
            make_trade(1.0, 0.0, 1),
            make_trade(1.0, 0.0, 1),
            make_trade(1.0, 0.0, 1), // 3 consecutive wins
            make_trade(-1.0, 0.0, 1),
            make_trade(-1.0, 0.0, 1), // 2 consecutive losses
        ];
        let metrics = MetricsCalculator::new(100.0).calculate(&trades, &[]);
        assert_eq!(metrics.max_consecutive_wins, 3);
        assert_eq!(metrics.max_consecutive_losses, 2);
    }

    #[test]
    fn test_max_drawdown_from_curve() {
        let curve = vec![
            make_point(0, 100.0, 0.0, 0.0),
            make_point(1, 120.0, 0.0, 0.0),
            make_point(2, 90.0, 30.0, 25.0),
            make_point(3, 110.0, 10.0, 8.333),
        ];
        let metrics = MetricsCalculator::new(100.0).calculate(&[], &curve);
        assert_relative_eq!(metrics.max_drawdown, 30.0);
        assert_relative_eq!(metrics.max_drawdown_pct, 25.0);
        assert!(metrics.sharpe_ratio.is_finite());
    }

    #[test]
    fn test_flat_curve_has_zero_sharpe() {
        let curve = vec![
            make_point(0, 100.0, 0.0, 0.0),
            make_point(1, 100.0, 0.0, 0.0),
            make_point(2, 100.0, 0.0, 0.0),
        ];
        let metrics = MetricsCalculator::new(100.0).calculate(&[], &curve);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_rising_curve_has_positive_sharpe() {
        let curve = vec![
            make_point(0, 101.0, 0.0, 0.0),
            make_point(1, 103.0, 0.0, 0.0),
            make_point(2, 104.0, 0.0, 0.0),
        ];
        let metrics = MetricsCalculator::new(100.0).calculate(&[], &curve);
        assert!(metrics.sharpe_ratio > 0.0);
    }
}
