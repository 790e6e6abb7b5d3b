//! Bar ingestion for the crypto-bot backtester.
//!
//! This crate handles:
//! - CSV parsing with a configurable column layout
//! - Null-value substitution and numeric validation
//! - Timestamp ordering checks

pub mod bar_sequence;
pub mod csv_reader;

pub use bar_sequence::BarSequence;
pub use csv_reader::CsvBarReader;
