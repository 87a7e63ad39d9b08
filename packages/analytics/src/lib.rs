#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over air quality measurement tables.
//!
//! Each public function takes a loaded table and returns a typed result
//! from [`air_quality_analytics_models`]. Nothing here renders; callers
//! print or serialize the results.

pub mod correlation;
pub mod monthly;
pub mod profile;

pub use correlation::{correlation_matrix, min_max_scale, pollutant_correlations};
pub use monthly::monthly_aggregates;
pub use profile::hour_weekday_pivot;

use thiserror::Error;

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// A requested column is not in the table.
    #[error("Unknown column '{column}'")]
    UnknownColumn {
        /// Column name as requested.
        column: String,
    },

    /// A date parameter could not be parsed.
    #[error("Invalid date '{value}': {message}. Expected format: YYYY-MM-DD")]
    InvalidDate {
        /// Raw parameter value.
        value: String,
        /// Parser message.
        message: String,
    },
}
