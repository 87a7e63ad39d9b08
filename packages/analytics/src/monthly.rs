//! Monthly per-station aggregates.

use std::collections::BTreeMap;

use air_quality_analytics_models::{
    Aggregate, MonthlyAggregateParams, MonthlyAggregateResult, MonthlyValue,
};
use air_quality_data::MeasurementTable;
use chrono::{NaiveDate, NaiveDateTime};

use crate::AnalyticsError;

/// Parses `"2024-01-01"` (or a full `"2024-01-01T00:00:00"` timestamp, whose
/// date part is used).
fn parse_date(s: &str) -> Result<NaiveDate, AnalyticsError> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| AnalyticsError::InvalidDate {
        value: s.to_string(),
        message: e.to_string(),
    })
}

fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, AnalyticsError> {
    s.map(parse_date).transpose()
}

fn describe_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> String {
    match (from, to) {
        (Some(f), Some(t)) => format!("{f} to {t}"),
        (Some(f), None) => format!("from {f}"),
        (None, Some(t)) => format!("until {t}"),
        (None, None) => "all dates".to_string(),
    }
}

#[derive(Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    max: Option<f64>,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self, aggregate: Aggregate) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match aggregate {
            Aggregate::Mean => Some(self.sum / self.count as f64),
            Aggregate::Max => self.max,
        }
    }
}

/// Aggregates each station's readings per calendar month.
///
/// Rows outside the date range are ignored, as are missing readings. A
/// month appears in the result if any row in range falls in it.
///
/// # Errors
///
/// * [`AnalyticsError::UnknownColumn`] if a station is not in the table.
/// * [`AnalyticsError::InvalidDate`] if a date parameter does not parse.
pub fn monthly_aggregates(
    table: &MeasurementTable,
    params: &MonthlyAggregateParams,
) -> Result<MonthlyAggregateResult, AnalyticsError> {
    let from = parse_optional_date(params.date_from.as_deref())?;
    let to = parse_optional_date(params.date_to.as_deref())?;

    let columns = params
        .stations
        .iter()
        .map(|station| {
            table
                .column(station)
                .ok_or_else(|| AnalyticsError::UnknownColumn {
                    column: station.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut months: BTreeMap<(i32, u32), Vec<Accumulator>> = BTreeMap::new();

    for row in table.rows_between(from, to) {
        let (Some(year), Some(month)) = (table.year(row), table.month(row)) else {
            continue;
        };
        let accumulators = months
            .entry((year, month))
            .or_insert_with(|| vec![Accumulator::default(); columns.len()]);

        for (acc, column) in accumulators.iter_mut().zip(&columns) {
            if let Some(value) = column[row] {
                acc.push(value);
            }
        }
    }

    log::debug!(
        "Aggregated {} station(s) over {} month(s) ({})",
        columns.len(),
        months.len(),
        params.aggregate
    );

    let rows = months
        .into_iter()
        .map(|((year, month), accumulators)| MonthlyValue {
            year,
            month,
            values: accumulators
                .into_iter()
                .map(|acc| acc.finish(params.aggregate))
                .collect(),
        })
        .collect();

    Ok(MonthlyAggregateResult {
        aggregate: params.aggregate,
        stations: params.stations.clone(),
        rows,
        date_range: describe_range(from, to),
    })
}
