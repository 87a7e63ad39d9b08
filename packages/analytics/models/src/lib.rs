#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parameter and result types for the air quality aggregations.
//!
//! Results serialize to camelCase JSON. Undefined numbers (an empty group,
//! a correlation with no variance) are `None` or `NaN`, which `serde_json`
//! writes as `null`.

use serde::{Deserialize, Serialize};

/// Weekday column labels of an [`HourWeekdayPivot`], Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// How readings within one month are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    /// Arithmetic mean of the non-missing readings.
    #[default]
    Mean,
    /// Largest non-missing reading.
    Max,
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// Parameters for monthly per-station aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregateParams {
    /// Station columns to aggregate, in output order.
    pub stations: Vec<String>,
    /// Start date (ISO 8601), inclusive.
    pub date_from: Option<String>,
    /// End date (ISO 8601), inclusive of the whole day.
    pub date_to: Option<String>,
    pub aggregate: Aggregate,
}

/// One calendar month of aggregated readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyValue {
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
    /// One entry per requested station, `None` if the station had no
    /// readings that month.
    pub values: Vec<Option<f64>>,
}

/// Result of a monthly aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregateResult {
    pub aggregate: Aggregate,
    pub stations: Vec<String>,
    /// Chronological.
    pub rows: Vec<MonthlyValue>,
    /// Date range description.
    pub date_range: String,
}

impl MonthlyAggregateResult {
    /// The series for one station, as `(year, month, value)`.
    #[must_use]
    pub fn series(&self, station: &str) -> Option<Vec<(i32, u32, Option<f64>)>> {
        let idx = self.stations.iter().position(|s| s == station)?;
        Some(
            self.rows
                .iter()
                .map(|row| (row.year, row.month, row.values[idx]))
                .collect(),
        )
    }
}

/// Mean reading by hour of day and day of week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourWeekdayPivot {
    pub pollutant: String,
    /// Column labels, [`WEEKDAY_LABELS`].
    pub weekdays: Vec<String>,
    /// 24 rows (hour 0-23) of 7 cells in weekday order.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl HourWeekdayPivot {
    /// Mean for `hour` (0-23) on `weekday` (0 = Sunday).
    #[must_use]
    pub fn cell(&self, hour: usize, weekday: usize) -> Option<f64> {
        self.cells.get(hour)?.get(weekday).copied().flatten()
    }
}

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared. `NaN` where undefined.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    /// Entries strictly below the diagonal as `(row, column, r)`.
    pub fn lower_triangle(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.columns.iter().enumerate().flat_map(move |(i, a)| {
            self.columns[..i]
                .iter()
                .enumerate()
                .map(move |(j, b)| (a.as_str(), b.as_str(), self.values[i][j]))
        })
    }
}
