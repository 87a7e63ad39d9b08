#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sample and pairwise test result types.
//!
//! These are the inputs and outputs of the pairwise comparator in
//! `air_quality_stats`. Results serialize in camelCase for the presentation
//! layer.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fixed significance threshold. A result is significant iff
/// `p_value < SIGNIFICANCE_LEVEL`.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// A named sequence of measurements.
///
/// Missing measurements are stored as `None`. A `Some(NaN)` is treated as
/// missing as well, so callers can feed raw float columns straight in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Sample {
    /// Builds a sample from raw floats; NaN marks a missing value.
    #[must_use]
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Some).collect(),
        }
    }

    #[must_use]
    pub fn from_options(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Values with missing entries removed, in original order.
    #[must_use]
    pub fn usable_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|v| v.filter(|x| !x.is_nan()))
            .collect()
    }

    /// Number of non-missing values.
    #[must_use]
    pub fn usable_len(&self) -> usize {
        self.values
            .iter()
            .filter(|v| v.is_some_and(|x| !x.is_nan()))
            .count()
    }
}

/// How the p-value of a rank-sum test is obtained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PValueMethod {
    /// Exact when there are no ties and one side has at most 8 values,
    /// asymptotic otherwise. Only valid as a request; results always
    /// record the method actually used.
    #[default]
    Auto,
    /// Exact permutation distribution of U.
    Exact,
    /// Normal approximation with tie and continuity correction.
    Asymptotic,
}

/// Outcome of one two-sample comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairwiseTestResult {
    pub name_a: String,
    pub name_b: String,
    /// Mann-Whitney U for sample A.
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    pub is_significant: bool,
    /// Usable values in sample A.
    pub n_a: usize,
    /// Usable values in sample B.
    pub n_b: usize,
    pub method: PValueMethod,
}

impl PairwiseTestResult {
    /// Builds a result, deriving `is_significant` from `p_value`.
    #[must_use]
    pub fn new(
        name_a: impl Into<String>,
        name_b: impl Into<String>,
        statistic: f64,
        p_value: f64,
        n_a: usize,
        n_b: usize,
        method: PValueMethod,
    ) -> Self {
        Self {
            name_a: name_a.into(),
            name_b: name_b.into(),
            statistic,
            p_value,
            is_significant: p_value < SIGNIFICANCE_LEVEL,
            n_a,
            n_b,
            method,
        }
    }
}

/// A pair that could not be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPair {
    pub name_a: String,
    pub name_b: String,
    /// Human-readable reason, e.g. "Sample 'SO2' has no usable values".
    pub reason: String,
}

/// All pairwise outcomes for one batch.
///
/// `results.len() + skipped.len()` is always `n * (n - 1) / 2` for `n`
/// input samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub results: Vec<PairwiseTestResult>,
    pub skipped: Vec<SkippedPair>,
}

impl ComparisonReport {
    /// Total pairs considered, compared or not.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.results.len() + self.skipped.len()
    }

    /// Looks up the result for a pair in either order.
    #[must_use]
    pub fn find(&self, a: &str, b: &str) -> Option<&PairwiseTestResult> {
        self.results
            .iter()
            .find(|r| (r.name_a == a && r.name_b == b) || (r.name_a == b && r.name_b == a))
    }
}
