//! Hour-of-day by day-of-week profile.

use air_quality_analytics_models::{HourWeekdayPivot, WEEKDAY_LABELS};
use air_quality_data::SeasonTable;
use air_quality_geo_models::Pollutant;
use crate::AnalyticsError;

const HOURS: usize = 24;
const DAYS: usize = 7;

/// Mean of one pollutant for every (hour, weekday) cell of the seasonal
/// table. Columns run Sunday to Saturday. Cells without readings are
/// `None`.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownColumn`] if the table has no column for
/// the pollutant.
#[allow(clippy::cast_precision_loss)]
pub fn hour_weekday_pivot(
    table: &SeasonTable,
    pollutant: Pollutant,
) -> Result<HourWeekdayPivot, AnalyticsError> {
    let values = table
        .pollutant(pollutant)
        .ok_or_else(|| AnalyticsError::UnknownColumn {
            column: pollutant.to_string(),
        })?;

    let mut sums = [[0.0_f64; DAYS]; HOURS];
    let mut counts = [[0_usize; DAYS]; HOURS];

    let rows = &table.measurements;
    for (row, value) in values.iter().enumerate() {
        let (Some(value), Some(hour), Some(weekday)) = (value, rows.hour(row), rows.weekday(row))
        else {
            continue;
        };
        let hour = hour as usize;
        let day = weekday.num_days_from_sunday() as usize;
        sums[hour][day] += value;
        counts[hour][day] += 1;
    }

    let cells = sums
        .iter()
        .zip(&counts)
        .map(|(sum_row, count_row)| {
            sum_row
                .iter()
                .zip(count_row)
                .map(|(sum, &count)| (count > 0).then(|| sum / count as f64))
                .collect()
        })
        .collect();

    Ok(HourWeekdayPivot {
        pollutant: pollutant.to_string(),
        weekdays: WEEKDAY_LABELS.iter().map(ToString::to_string).collect(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-07 is a Sunday, 2024-01-08 a Monday.
    const CSV: &str = "\
ts,O3,Season
2024-01-07 08:00,10,Winter
2024-01-14 08:00,20,Winter
2024-01-08 08:00,5,Winter
2024-01-08 23:00,,Winter
2024-01-13 00:00,7,Winter
";

    fn pivot() -> HourWeekdayPivot {
        let table = SeasonTable::from_reader(CSV.as_bytes(), "s", "ts", "Season").unwrap();
        hour_weekday_pivot(&table, Pollutant::O3).unwrap()
    }

    #[test]
    fn columns_start_on_sunday() {
        let pivot = pivot();
        assert_eq!(pivot.weekdays.first().map(String::as_str), Some("Sunday"));
        assert_eq!(pivot.weekdays.last().map(String::as_str), Some("Saturday"));
        assert_eq!(pivot.cells.len(), 24);
        assert!(pivot.cells.iter().all(|row| row.len() == 7));
    }

    #[test]
    fn averages_each_cell() {
        let pivot = pivot();
        assert_eq!(pivot.cell(8, 0), Some(15.0));
        assert_eq!(pivot.cell(8, 1), Some(5.0));
        assert_eq!(pivot.cell(0, 6), Some(7.0));
    }

    #[test]
    fn missing_readings_leave_cells_empty() {
        let pivot = pivot();
        assert_eq!(pivot.cell(23, 1), None);
        assert_eq!(pivot.cell(12, 3), None);
    }

    #[test]
    fn unknown_pollutant_is_an_error() {
        let table = SeasonTable::from_reader(CSV.as_bytes(), "s", "ts", "Season").unwrap();
        assert!(matches!(
            hour_weekday_pivot(&table, Pollutant::SO2),
            Err(AnalyticsError::UnknownColumn { column }) if column == "SO2"
        ));
    }
}
