//! Backtesting engine for the crypto-bot SMA/EMA strategy.
//!
//! This crate provides:
//! - Bar-by-bar replay with next-bar fills
//! - Commission accounting and a single-position broker
//! - Round-trip ledger and equity curve
//! - Performance metrics

pub mod broker;
pub mod fill_model;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod simulator;
pub mod strategy;

pub use broker::{Broker, REJECTED_ORDER_ID};
pub use fill_model::FillModel;
pub use metrics::{BacktestMetrics, MetricsCalculator};
pub use portfolio::{portfolio_value, EquityPoint, PortfolioSnapshot, PortfolioTracker, ProfitSummary};
pub use position::{ClosedTrade, Position, TradeLedger};
pub use simulator::{Backtest, BacktestReport, OrderEvent};
pub use strategy::{BarStep, Decision, StrategyController, StrategyPhase, StrategyState};
