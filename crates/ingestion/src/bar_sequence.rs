//! Validated, immutable bar sequence.

use cryptobot_core::{Bar, Error, Result};
use serde::Serialize;

/// Ordered bars with strictly increasing timestamps.
///
/// Once built the sequence cannot be modified. Runs borrow it, so the same
/// sequence can be replayed by any number of independent backtests.
#[derive(Debug, Clone, Serialize)]
pub struct BarSequence {
    bars: Vec<Bar>,
}

impl BarSequence {
    /// Build a sequence, checking that it is non-empty and strictly ordered.
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(Error::data_format("input contains no bars"));
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].ts <= pair[0].ts {
                return Err(Error::data_format(format!(
                    "bar {} timestamp {} is not after previous bar timestamp {}",
                    i + 1,
                    pair[1].ts_string(),
                    pair[0].ts_string(),
                )));
            }
        }
        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Iterate bars in timestamp order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    /// Closing prices in order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

impl<'a> IntoIterator for &'a BarSequence {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    fn make_bar(minute: i64, close: f64) -> Bar {
        Bar {
            ts: ts(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_ordered_sequence() {
        let seq = BarSequence::new(vec![make_bar(0, 1.0), make_bar(1, 2.0), make_bar(5, 3.0)])
            .unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(seq.last().unwrap().close, 3.0);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(BarSequence::new(vec![]), Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_rejects_duplicate_timestamp() {
        let result = BarSequence::new(vec![make_bar(0, 1.0), make_bar(0, 2.0)]);
        assert!(matches!(result, Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let result = BarSequence::new(vec![make_bar(2, 1.0), make_bar(1, 2.0)]);
        assert!(matches!(result, Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_replayable() {
        let seq = BarSequence::new(vec![make_bar(0, 1.0), make_bar(1, 2.0)]).unwrap();
        let first: Vec<f64> = seq.iter().map(|b| b.close).collect();
        let second: Vec<f64> = (&seq).into_iter().map(|b| b.close).collect();
        assert_eq!(first, second);
    }
}
