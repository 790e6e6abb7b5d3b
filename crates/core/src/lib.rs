//! Core types and configuration for the crypto-bot backtester.
//!
//! This crate provides shared types used across all other crates:
//! - Market data and order types (bars, orders, statuses)
//! - Indicator snapshots and signals
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{BrokerConfig, Config, DataConfig, FillTiming, IndicatorConfig, StrategyConfig};
pub use error::{Error, Result};
pub use types::*;
