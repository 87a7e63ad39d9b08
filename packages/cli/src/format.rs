//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use air_quality_analytics_models::{CorrelationMatrix, HourWeekdayPivot, MonthlyAggregateResult};
use air_quality_geo_models::{DistanceResult, Station};
use air_quality_stats_models::ComparisonReport;

fn value_or_dash(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

#[must_use]
pub fn stations(stations: &[Station]) -> String {
    let mut out = String::new();
    writeln!(out, "{:<28} {:>10} {:>10}  POLLUTANTS", "STATION", "LAT", "LON").unwrap();
    writeln!(out, "{}", "-".repeat(80)).unwrap();
    for station in stations {
        writeln!(
            out,
            "{:<28} {:>10.5} {:>10.5}  {}",
            station.name,
            station.location.latitude,
            station.location.longitude,
            station.pollutant_label()
        )
        .unwrap();
    }
    writeln!(out, "\n{} station(s)", stations.len()).unwrap();
    out
}

#[must_use]
pub fn nearby(city: &str, radius_km: f64, results: &[DistanceResult]) -> String {
    let mut out = String::new();
    if results.is_empty() {
        writeln!(out, "No stations within {radius_km} km of {city}.").unwrap();
        return out;
    }

    writeln!(out, "Stations within {radius_km} km of {city}\n").unwrap();
    writeln!(out, "{:<28} {:>10} {:>10} {:>10}", "STATION", "KM", "LAT", "LON").unwrap();
    writeln!(out, "{}", "-".repeat(61)).unwrap();
    for r in results {
        writeln!(
            out,
            "{:<28} {:>10.2} {:>10.5} {:>10.5}",
            r.name, r.distance_km, r.location.latitude, r.location.longitude
        )
        .unwrap();
    }
    out
}

#[must_use]
pub fn comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:<14} {:<14} {:>10} {:>10} {:>6} {:>6}  {:<11} SIGNIFICANT",
        "A", "B", "U", "P", "N_A", "N_B", "METHOD"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(90)).unwrap();
    for r in &report.results {
        writeln!(
            out,
            "{:<14} {:<14} {:>10.1} {:>10.4} {:>6} {:>6}  {:<11} {}",
            r.name_a,
            r.name_b,
            r.statistic,
            r.p_value,
            r.n_a,
            r.n_b,
            r.method.as_ref(),
            if r.is_significant { "yes" } else { "no" }
        )
        .unwrap();
    }

    if !report.skipped.is_empty() {
        writeln!(out, "\nSkipped:").unwrap();
        for s in &report.skipped {
            writeln!(out, "  {} vs {}: {}", s.name_a, s.name_b, s.reason).unwrap();
        }
    }
    out
}

#[must_use]
pub fn monthly(result: &MonthlyAggregateResult) -> String {
    let mut out = String::new();
    writeln!(out, "Monthly {} ({})\n", result.aggregate, result.date_range).unwrap();

    write!(out, "{:<8}", "MONTH").unwrap();
    for station in &result.stations {
        write!(out, " {station:>14}").unwrap();
    }
    writeln!(out).unwrap();

    for row in &result.rows {
        write!(out, "{:04}-{:02} ", row.year, row.month).unwrap();
        for value in &row.values {
            write!(out, " {:>14}", value_or_dash(*value, 2)).unwrap();
        }
        writeln!(out).unwrap();
    }
    out
}

#[must_use]
pub fn pivot(pivot: &HourWeekdayPivot) -> String {
    let mut out = String::new();
    writeln!(out, "Mean {} by hour and weekday\n", pivot.pollutant).unwrap();

    write!(out, "{:<5}", "HOUR").unwrap();
    for day in &pivot.weekdays {
        let short: String = day.chars().take(3).collect();
        write!(out, " {short:>8}").unwrap();
    }
    writeln!(out).unwrap();

    for (hour, row) in pivot.cells.iter().enumerate() {
        write!(out, "{hour:<5}").unwrap();
        for value in row {
            write!(out, " {:>8}", value_or_dash(*value, 1)).unwrap();
        }
        writeln!(out).unwrap();
    }
    out
}

#[must_use]
pub fn correlations(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    write!(out, "{:<6}", "").unwrap();
    for column in &matrix.columns {
        write!(out, " {column:>7}").unwrap();
    }
    writeln!(out).unwrap();

    for (column, row) in matrix.columns.iter().zip(&matrix.values) {
        write!(out, "{column:<6}").unwrap();
        for r in row {
            let cell = if r.is_nan() {
                "-".to_string()
            } else {
                format!("{r:.2}")
            };
            write!(out, " {cell:>7}").unwrap();
        }
        writeln!(out).unwrap();
    }
    out
}
