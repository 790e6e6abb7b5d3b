//! Configuration structures for the crypto-bot backtester.

use crate::error::{Error, Result};
use crate::types::TIMESTAMP_FORMAT;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input bar file layout.
    pub data: DataConfig,
    /// Indicator periods.
    pub indicators: IndicatorConfig,
    /// Strategy parameters.
    pub strategy: StrategyConfig,
    /// Broker simulation parameters.
    pub broker: BrokerConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.data.validate()?;
        self.indicators.validate()?;
        self.strategy.validate()?;
        self.broker.validate()?;
        Ok(())
    }
}

/// Column layout of the bar CSV.
///
/// Indices are zero-based. `None` marks a field absent from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Whether the first record is a header row.
    pub has_headers: bool,
    /// chrono format string for the timestamp column.
    pub timestamp_format: String,
    /// Value substituted for empty numeric fields.
    pub null_value: f64,
    pub datetime_col: usize,
    pub open_col: usize,
    pub high_col: usize,
    pub low_col: usize,
    pub close_col: usize,
    pub volume_col: Option<usize>,
    /// Open interest is read for validation only; bars do not carry it.
    pub open_interest_col: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            has_headers: true,
            timestamp_format: TIMESTAMP_FORMAT.to_string(),
            null_value: 0.0,
            datetime_col: 0,
            open_col: 1,
            high_col: 2,
            low_col: 3,
            close_col: 4,
            volume_col: Some(5),
            open_interest_col: None,
        }
    }
}

impl DataConfig {
    /// Smallest record width that covers every configured column.
    pub fn min_columns(&self) -> usize {
        [
            Some(self.datetime_col),
            Some(self.open_col),
            Some(self.high_col),
            Some(self.low_col),
            Some(self.close_col),
            self.volume_col,
            self.open_interest_col,
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |max| max + 1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timestamp_format.is_empty() {
            return Err(Error::config("timestamp_format must not be empty"));
        }
        if !self.null_value.is_finite() {
            return Err(Error::config("null_value must be finite"));
        }
        Ok(())
    }
}

/// Indicator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Simple moving average window (bars).
    pub sma_period: usize,
    /// Exponential moving average period (bars).
    pub ema_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 30,
            ema_period: 30,
        }
    }
}

impl IndicatorConfig {
    /// Bars required before any indicator value is reported.
    pub fn warmup(&self) -> usize {
        self.sma_period.max(self.ema_period)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sma_period == 0 {
            return Err(Error::config("sma_period must be positive"));
        }
        if self.ema_period == 0 {
            return Err(Error::config("ema_period must be positive"));
        }
        Ok(())
    }
}

/// Strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Quantity bought on each entry.
    pub order_size: f64,
    /// Relative distance of close from the SMA that triggers an exit.
    pub sell_deviation: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            order_size: 1.0,
            sell_deviation: 0.10,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.order_size.is_finite() && self.order_size > 0.0) {
            return Err(Error::config(format!(
                "order_size must be positive, got {}",
                self.order_size
            )));
        }
        if !(self.sell_deviation.is_finite() && self.sell_deviation > 0.0) {
            return Err(Error::config(format!(
                "sell_deviation must be positive, got {}",
                self.sell_deviation
            )));
        }
        Ok(())
    }
}

/// Which price of the execution bar fills a pending order.
///
/// Orders are always filled on the bar after the one they were submitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillTiming {
    /// Close of the next bar.
    #[default]
    NextClose,
    /// Open of the next bar.
    NextOpen,
}

/// Broker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Cash at the start of the run.
    pub starting_cash: f64,
    /// Commission as a fraction of notional per fill (0.075 = 7.5%).
    pub commission_rate: f64,
    /// Fill price selection.
    pub fill_timing: FillTiming,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            starting_cash: 100.0,
            commission_rate: 0.075,
            fill_timing: FillTiming::NextClose,
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.starting_cash.is_finite() && self.starting_cash > 0.0) {
            return Err(Error::config(format!(
                "starting_cash must be positive, got {}",
                self.starting_cash
            )));
        }
        if !(self.commission_rate > 0.0 && self.commission_rate < 1.0) {
            return Err(Error::config(format!(
                "commission_rate must be in (0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}
