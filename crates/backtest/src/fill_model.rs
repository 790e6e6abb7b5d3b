//! Fill model for backtesting.
//!
//! Picks the fill price on the execution bar and computes commission.
//! There is no slippage and no order-book depth: every order fills in full
//! at a single deterministic price.

use cryptobot_core::{Bar, BrokerConfig, FillTiming};

/// Fill model for simulating order execution.
#[derive(Debug, Clone)]
pub struct FillModel {
    timing: FillTiming,
    /// Commission as a fraction of notional.
    commission_rate: f64,
}

impl FillModel {
    /// Create a new fill model.
    pub fn new(timing: FillTiming, commission_rate: f64) -> Self {
        Self {
            timing,
            commission_rate,
        }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(config.fill_timing, config.commission_rate)
    }

    /// Price at which a pending order fills on `bar`.
    pub fn fill_price(&self, bar: &Bar) -> f64 {
        match self.timing {
            FillTiming::NextClose => bar.close,
            FillTiming::NextOpen => bar.open,
        }
    }

    /// Commission for trading `size` units at `price`.
    pub fn commission(&self, price: f64, size: f64) -> f64 {
        price * size * self.commission_rate
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn timing(&self) -> FillTiming {
        self.timing
    }
}
