//! Indicator and signal computation for the crypto-bot backtester.
//!
//! This crate handles:
//! - Rolling simple moving average
//! - Seeded exponential moving average
//! - Shared indicator warm-up
//! - The entry/exit signal rule

pub mod ema;
pub mod engine;
pub mod signal;
pub mod sma;

pub use ema::ExponentialMovingAverage;
pub use engine::IndicatorEngine;
pub use signal::{evaluate, SignalEvaluator, DEFAULT_SELL_DEVIATION};
pub use sma::SimpleMovingAverage;
