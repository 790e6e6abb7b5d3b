//! Entry/exit signal rule.
//!
//! Entry needs the close above both averages while the SMA sits above the
//! EMA. Exit fires when the close strays from the SMA by more than the
//! configured fraction of the close, in either direction.

use cryptobot_core::{IndicatorSnapshot, Signal, StrategyConfig};

/// Default exit threshold: 10% away from the SMA.
pub const DEFAULT_SELL_DEVIATION: f64 = 0.10;

/// Evaluate with the default exit threshold.
pub fn evaluate(close: f64, sma: Option<f64>, ema: Option<f64>) -> Signal {
    SignalEvaluator::default().evaluate(close, sma, ema)
}

/// Pure signal evaluator.
#[derive(Debug, Clone, Copy)]
pub struct SignalEvaluator {
    sell_deviation: f64,
}

impl SignalEvaluator {
    pub fn new(sell_deviation: f64) -> Self {
        Self { sell_deviation }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.sell_deviation)
    }

    /// Both flags are false while either indicator is undefined.
    pub fn evaluate(&self, close: f64, sma: Option<f64>, ema: Option<f64>) -> Signal {
        let (sma, ema) = match (sma, ema) {
            (Some(sma), Some(ema)) => (sma, ema),
            _ => return Signal::NONE,
        };

        let buy = close > sma && close > ema && sma > ema;
        // A zero close yields NaN or infinity here; NaN compares false.
        let sell = (close - sma).abs() / close > self.sell_deviation;

        Signal { buy, sell }
    }

    /// Evaluate against an indicator snapshot.
    pub fn evaluate_snapshot(&self, close: f64, snapshot: &IndicatorSnapshot) -> Signal {
        self.evaluate(close, snapshot.sma, snapshot.ema)
    }

    pub fn sell_deviation(&self) -> f64 {
        self.sell_deviation
    }
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_SELL_DEVIATION)
    }
}
