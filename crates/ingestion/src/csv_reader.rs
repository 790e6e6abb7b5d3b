//! CSV bar reader.
//!
//! Reads OHLCV records laid out by a [`DataConfig`] into a [`BarSequence`].
//! Any problem with the file aborts the read; no partial sequence is returned.

use crate::bar_sequence::BarSequence;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use cryptobot_core::{Bar, DataConfig, Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Reader for bar CSV files.
pub struct CsvBarReader {
    layout: DataConfig,
}

impl CsvBarReader {
    /// Create a reader for the given column layout.
    pub fn new(layout: DataConfig) -> Self {
        Self { layout }
    }

    /// Read bars from a file on disk.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<BarSequence> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let bars = self.read(file)?;
        info!(path = %path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }

    /// Read bars from any reader.
    pub fn read<R: Read>(&self, source: R) -> Result<BarSequence> {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.layout.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let mut bars: Vec<Bar> = Vec::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line());
            let bar = self.parse_record(&record, line)?;

            if let Some(prev) = bars.last() {
                if bar.ts <= prev.ts {
                    return Err(Error::data_format_at(
                        line,
                        format!(
                            "timestamp {} is not after previous timestamp {}",
                            bar.ts_string(),
                            prev.ts_string()
                        ),
                    ));
                }
            }
            bars.push(bar);
        }

        debug!(records = bars.len(), "parsed bar records");
        BarSequence::new(bars)
    }

    fn parse_record(&self, record: &StringRecord, line: u64) -> Result<Bar> {
        let needed = self.layout.min_columns();
        if record.len() < needed {
            return Err(Error::data_format_at(
                line,
                format!("expected at least {needed} fields, found {}", record.len()),
            ));
        }

        let ts = self.parse_timestamp(&record[self.layout.datetime_col], line)?;
        let volume = match self.layout.volume_col {
            Some(col) => self.parse_number(record, col, "volume", line)?,
            None => self.layout.null_value,
        };
        if let Some(col) = self.layout.open_interest_col {
            self.parse_number(record, col, "open interest", line)?;
        }

        Ok(Bar {
            ts,
            open: self.parse_number(record, self.layout.open_col, "open", line)?,
            high: self.parse_number(record, self.layout.high_col, "high", line)?,
            low: self.parse_number(record, self.layout.low_col, "low", line)?,
            close: self.parse_number(record, self.layout.close_col, "close", line)?,
            volume,
        })
    }

    fn parse_timestamp(&self, field: &str, line: u64) -> Result<NaiveDateTime> {
        let format = self.layout.timestamp_format.as_str();
        NaiveDateTime::parse_from_str(field, format)
            .or_else(|_| {
                // Date-only formats carry no time of day.
                NaiveDate::parse_from_str(field, format).map(|d| d.and_time(NaiveTime::MIN))
            })
            .map_err(|e| {
                Error::data_format_at(line, format!("bad timestamp {field:?} ({format}): {e}"))
            })
    }

    fn parse_number(&self, record: &StringRecord, col: usize, name: &str, line: u64) -> Result<f64> {
        let field = &record[col];
        if field.is_empty() {
            return Ok(self.layout.null_value);
        }
        let value: f64 = field
            .parse()
            .map_err(|e| Error::data_format_at(line, format!("bad {name} value {field:?}: {e}")))?;
        if !value.is_finite() {
            return Err(Error::data_format_at(
                line,
                format!("{name} value {field:?} is not finite"),
            ));
        }
        Ok(value)
    }
}

impl Default for CsvBarReader {
    fn default() -> Self {
        Self::new(DataConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const HEADER: &str = "timestamp,open,high,low,close,volume\n";

    fn read_str(data: &str) -> Result<BarSequence> {
        CsvBarReader::default().read(data.as_bytes())
    }

    #[test]
    fn test_reads_basic_file() {
        let data = format!(
            "{HEADER}2021-01-01 00:00:00,10.0,11.0,9.5,10.5,120\n\
             2021-01-01 00:01:00,10.5,10.8,10.1,10.2,80\n"
        );
        let bars = read_str(&data).unwrap();
        assert_eq!(bars.len(), 2);

        let first = bars.first().unwrap();
        assert_eq!(first.ts_string(), "2021-01-01 00:00:00");
        assert_relative_eq!(first.open, 10.0);
        assert_relative_eq!(first.high, 11.0);
        assert_relative_eq!(first.low, 9.5);
        assert_relative_eq!(first.close, 10.5);
        assert_relative_eq!(first.volume, 120.0);
    }

    #[test]
    fn test_extra_columns_ignored() {
        // Downloader output carries exchange-specific columns after volume.
        let data = "timestamp,open,high,low,close,volume,close_time,quote_av,trades\n\
                    2021-01-01 00:00:00,1,2,0.5,1.5,10,1609459259999,15.0,42\n";
        let bars = read_str(data).unwrap();
        assert_eq!(bars.len(), 1);
        assert_relative_eq!(bars.first().unwrap().close, 1.5);
    }

    #[test]
    fn test_empty_field_uses_null_value() {
        let data = format!("{HEADER}2021-01-01 00:00:00,1,2,0.5,1.5,\n");
        let bars = read_str(&data).unwrap();
        assert_eq!(bars.first().unwrap().volume, 0.0);
    }

    #[test]
    fn test_no_header_layout() {
        let layout = DataConfig {
            has_headers: false,
            ..Default::default()
        };
        let data = "2021-01-01 00:00:00,1,2,0.5,1.5,10\n";
        let bars = CsvBarReader::new(layout).read(data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_custom_columns_without_volume() {
        let layout = DataConfig {
            has_headers: false,
            timestamp_format: "%Y-%m-%d".to_string(),
            datetime_col: 0,
            close_col: 1,
            open_col: 2,
            high_col: 3,
            low_col: 4,
            volume_col: None,
            ..Default::default()
        };
        let data = "2021-03-01,5.0,4.0,6.0,3.0\n2021-03-02,5.5,5.0,6.0,4.5\n";
        let bars = CsvBarReader::new(layout).read(data.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        let last = bars.last().unwrap();
        assert_eq!(last.ts_string(), "2021-03-02 00:00:00");
        assert_relative_eq!(last.close, 5.5);
        assert_relative_eq!(last.open, 5.0);
        assert_eq!(last.volume, 0.0);
    }

    #[test]
    fn test_bad_number_is_data_format_error() {
        let data = format!("{HEADER}2021-01-01 00:00:00,1,2,0.5,abc,10\n");
        let err = read_str(&data).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("close"));
    }

    #[test]
    fn test_non_finite_number_rejected() {
        let data = format!("{HEADER}2021-01-01 00:00:00,1,2,0.5,NaN,10\n");
        assert!(matches!(read_str(&data), Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let data = format!("{HEADER}01/01/2021,1,2,0.5,1.5,10\n");
        assert!(matches!(read_str(&data), Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_short_row_rejected() {
        let data = format!("{HEADER}2021-01-01 00:00:00,1,2,0.5\n");
        let err = read_str(&data).unwrap_err();
        assert!(err.to_string().contains("expected at least 6 fields"));
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let data = format!(
            "{HEADER}2021-01-01 00:01:00,1,2,0.5,1.5,10\n\
             2021-01-01 00:00:00,1,2,0.5,1.5,10\n"
        );
        let err = read_str(&data).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_header_only_is_empty_input() {
        assert!(matches!(read_str(HEADER), Err(Error::DataFormat(_))));
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}2021-01-01 00:00:00,1,2,0.5,1.5,10\n").unwrap();
        let bars = CsvBarReader::default().read_path(file.path()).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvBarReader::default()
            .read_path("/nonexistent/bars.csv")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
