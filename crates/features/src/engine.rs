//! Indicator engine.
//!
//! Combines the SMA and EMA over closing prices behind a single per-bar
//! update, with one shared warm-up.

use crate::{ema::ExponentialMovingAverage, sma::SimpleMovingAverage};
use cryptobot_core::{Bar, IndicatorConfig, IndicatorSnapshot};
use tracing::debug;

/// Incremental indicator computation, one bar at a time.
pub struct IndicatorEngine {
    sma: SimpleMovingAverage,
    ema: ExponentialMovingAverage,
    /// Bars required before either value is reported.
    warmup: usize,
    /// Bars observed so far.
    bars_seen: usize,
}

impl IndicatorEngine {
    /// Create a new engine from configuration.
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            sma: SimpleMovingAverage::new(config.sma_period),
            ema: ExponentialMovingAverage::new(config.ema_period),
            warmup: config.warmup(),
            bars_seen: 0,
        }
    }

    /// Feed the next bar and return the indicator values after it.
    ///
    /// The EMA recursion starts on the first bar but is only reported once
    /// the shared warm-up has elapsed, together with the SMA.
    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        let sma = self.sma.update(bar.close);
        let ema = self.ema.update(bar.close);
        self.bars_seen += 1;

        if self.bars_seen == self.warmup {
            debug!(bars = self.bars_seen, "indicator warm-up complete");
        }

        if self.is_ready() {
            IndicatorSnapshot {
                sma,
                ema: Some(ema),
                bars_seen: self.bars_seen,
            }
        } else {
            IndicatorSnapshot {
                sma: None,
                ema: None,
                bars_seen: self.bars_seen,
            }
        }
    }

    /// Check if the engine has enough warmup data.
    pub fn is_ready(&self) -> bool {
        self.bars_seen >= self.warmup && self.sma.is_ready()
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.sma.clear();
        self.ema.clear();
        self.bars_seen = 0;
    }
}
