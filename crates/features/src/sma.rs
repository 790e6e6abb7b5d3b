//! Rolling simple moving average.

use std::collections::VecDeque;

/// Simple moving average over the last `period` values.
pub struct SimpleMovingAverage {
    /// Window size in periods.
    period: usize,
    /// Values currently in the window.
    window: VecDeque<f64>,
    /// Running sum of the window.
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new SMA. `period` must be at least 1.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    /// Add a value and return the average if the window is full.
    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window.len() >= self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }
        self.window.push_back(value);
        self.sum += value;
        self.value()
    }

    /// Current average, `None` until `period` values have been seen.
    pub fn value(&self) -> Option<f64> {
        if self.is_ready() {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.period > 0 && self.window.len() >= self.period
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}
