#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pairwise statistical comparator.
//!
//! Runs a two-sided Mann-Whitney U test for every unordered pair of named
//! samples (seasons of one pollutant, or different pollutants). A pair that
//! cannot be compared is reported as skipped; it never aborts the batch.

pub mod mann_whitney;
pub mod pairwise;

pub use mann_whitney::{MannWhitneyOutcome, mann_whitney_u};
pub use pairwise::{
    compare, compare_pair, compare_pair_with, compare_pairs, compare_samples, compare_samples_with,
};

use thiserror::Error;

/// Errors that can occur while comparing samples.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// A sample has no non-missing values.
    #[error("Sample '{name}' has no usable values")]
    InsufficientData {
        /// Name of the empty sample.
        name: String,
    },

    /// A sample was paired with itself.
    #[error("Cannot compare sample '{name}' against itself")]
    InvalidPair {
        /// Name supplied for both sides.
        name: String,
    },

    /// A requested pair names a sample that was not supplied.
    #[error("Unknown sample '{name}'")]
    UnknownSample {
        /// The name that could not be resolved.
        name: String,
    },
}
