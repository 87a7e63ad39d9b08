#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular data source for the air quality toolkit.
//!
//! Reads the station, city, per-pollutant and seasonal CSV exports, converts
//! station and city coordinates to WGS84 on load, and hands out named
//! [`air_quality_stats_models::Sample`]s for the comparator. Loaded tables
//! are cached per file and reloaded when the file changes on disk.

pub mod cache;
pub mod config;
pub mod locations;
pub mod measurements;
pub mod samples;
pub mod store;

pub use cache::DataCache;
pub use config::DatasetConfig;
pub use measurements::{MeasurementTable, SeasonTable};
pub use store::DataStore;

use thiserror::Error;

/// Errors that can occur while loading data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A required column is absent from a table.
    #[error("Missing column '{column}' in {table}")]
    MissingColumn {
        /// Column name that was looked up.
        column: String,
        /// Table (file or logical name) that was searched.
        table: String,
    },

    /// A timestamp cell could not be parsed.
    #[error("Invalid datetime '{value}' on row {row}")]
    InvalidDateTime {
        /// Raw cell contents.
        value: String,
        /// One-based data row number (header excluded).
        row: usize,
    },
}
