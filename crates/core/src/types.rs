//! Core data types for the crypto-bot backtester.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used by bar files and the order journal.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sequential order identifier, unique within one broker.
pub type OrderId = u64;

/// OHLCV price bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar timestamp.
    pub ts: NaiveDateTime,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume. Zero is the null sentinel, not an error.
    pub volume: f64,
}

impl Bar {
    /// Format the bar timestamp for journal output.
    pub fn ts_string(&self) -> String {
        self.ts.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Upper-case label used in the journal.
    pub fn label(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Order status.
///
/// `Submitted` and `Accepted` are live; the other four are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Rejected,
    /// Not enough cash to cover cost plus commission at fill time.
    Margin,
}

impl OrderStatus {
    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }
}

/// Fill details of a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Fill price.
    pub price: f64,
    /// Filled size.
    pub size: f64,
    /// Notional value (price * size).
    pub value: f64,
    /// Commission charged.
    pub commission: f64,
}

/// A single order and its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Broker-assigned id.
    pub id: OrderId,
    /// Buy or sell.
    pub side: Side,
    /// Requested quantity (positive).
    pub size: f64,
    /// Current status.
    pub status: OrderStatus,
    /// Index of the bar the order was submitted on.
    pub submitted_bar: usize,
    /// Fill details, set once the order is completed.
    pub execution: Option<Execution>,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    /// Is the order still waiting for execution?
    pub fn is_alive(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Indicator values after one bar.
///
/// Both values are `None` until warm-up completes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Simple moving average of closes.
    pub sma: Option<f64>,
    /// Exponential moving average of closes.
    pub ema: Option<f64>,
    /// Number of bars observed so far.
    pub bars_seen: usize,
}

impl IndicatorSnapshot {
    /// Are both indicators defined?
    pub fn is_ready(&self) -> bool {
        self.sma.is_some() && self.ema.is_some()
    }
}

/// Entry/exit decision for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signal {
    pub buy: bool,
    pub sell: bool,
}

impl Signal {
    /// Both flags off.
    pub const NONE: Signal = Signal {
        buy: false,
        sell: false,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_bar_ts_string() {
        let ts = NaiveDate::from_ymd_opt(2021, 12, 21)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        let bar = Bar {
            ts,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        assert_eq!(bar.ts_string(), "2021-12-21 13:05:00");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Margin.is_terminal());
    }

    #[test]
    fn test_snapshot_ready() {
        let mut snap = IndicatorSnapshot::default();
        assert!(!snap.is_ready());
        snap.sma = Some(1.0);
        assert!(!snap.is_ready());
        snap.ema = Some(1.0);
        assert!(snap.is_ready());
    }
}
