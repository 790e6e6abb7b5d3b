//! Exponential moving average.
//!
//! Seeded with the first observed value, then
//! `ema = alpha * value + (1 - alpha) * ema` with `alpha = 2 / (period + 1)`,
//! evaluated as `ema + alpha * (value - ema)` so a constant input is a fixed
//! point in floating point as well.

/// Recursive exponential moving average.
pub struct ExponentialMovingAverage {
    period: usize,
    alpha: f64,
    current: Option<f64>,
    count: usize,
}

impl ExponentialMovingAverage {
    /// Create a new EMA for the given period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            current: None,
            count: 0,
        }
    }

    /// Add a value and return the updated average.
    ///
    /// The recursion is defined from the first value on; callers decide when
    /// the value is mature enough to use.
    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.current {
            Some(prev) => prev + self.alpha * (value - prev),
            None => value,
        };
        self.current = Some(next);
        self.count += 1;
        next
    }

    /// Raw recursive value, regardless of maturity.
    pub fn value(&self) -> Option<f64> {
        self.current
    }

    /// Smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of values observed.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_alpha() {
        assert_relative_eq!(ExponentialMovingAverage::new(3).alpha(), 0.5);
        assert_relative_eq!(ExponentialMovingAverage::new(30).alpha(), 2.0 / 31.0);
    }

    #[test]
    fn test_seeded_with_first_value() {
        let mut ema = ExponentialMovingAverage::new(10);
        assert!(ema.value().is_none());
        assert_relative_eq!(ema.update(42.0), 42.0);
        assert_eq!(ema.count(), 1);
    }

    #[test]
    fn test_recursion() {
        // alpha = 0.5
        let mut ema = ExponentialMovingAverage::new(3);
        ema.update(10.0);
        assert_relative_eq!(ema.update(20.0), 15.0);
        assert_relative_eq!(ema.update(20.0), 17.5);
        assert_relative_eq!(ema.update(5.0), 11.25);
    }

    #[test]
    fn test_constant_series() {
        let mut ema = ExponentialMovingAverage::new(7);
        for _ in 0..50 {
            ema.update(3.25);
        }
        assert_eq!(ema.value(), Some(3.25));
    }
}
