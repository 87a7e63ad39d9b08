//! Named samples for the pairwise comparator.

use air_quality_geo_models::Pollutant;
use air_quality_stats_models::Sample;
use chrono::NaiveDate;

use crate::{DataError, MeasurementTable, SeasonTable};

fn missing(column: &str, table: &str) -> DataError {
    DataError::MissingColumn {
        column: column.to_string(),
        table: table.to_string(),
    }
}

/// One sample per season label holding the pollutant's readings for that
/// season. Samples come out in order of first appearance.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] if the table has no column for the
/// pollutant.
pub fn season_samples(table: &SeasonTable, pollutant: Pollutant) -> Result<Vec<Sample>, DataError> {
    let values = table
        .pollutant(pollutant)
        .ok_or_else(|| missing(pollutant.as_ref(), "seasons"))?;

    Ok(table
        .season_labels()
        .into_iter()
        .map(|label| {
            let season_values = table
                .seasons
                .iter()
                .zip(values)
                .filter(|(season, _)| season.as_str() == label)
                .map(|(_, value)| *value);
            Sample::from_options(label, season_values)
        })
        .collect())
}

/// One sample per pollutant over the whole seasonal table.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] for the first pollutant without a
/// column.
pub fn pollutant_samples(
    table: &SeasonTable,
    pollutants: &[Pollutant],
) -> Result<Vec<Sample>, DataError> {
    pollutants
        .iter()
        .map(|p| {
            table
                .pollutant(*p)
                .map(|values| Sample::from_options(p.to_string(), values.iter().copied()))
                .ok_or_else(|| missing(p.as_ref(), "seasons"))
        })
        .collect()
}

/// One sample per station column, restricted to rows dated within
/// `from..=to`.
///
/// # Errors
///
/// Returns [`DataError::MissingColumn`] for the first station without a
/// column.
pub fn station_samples(
    table: &MeasurementTable,
    stations: &[String],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<Sample>, DataError> {
    let rows = table.rows_between(from, to);

    stations
        .iter()
        .map(|station| {
            let column = table
                .column(station)
                .ok_or_else(|| missing(station, "measurements"))?;
            Ok(Sample::from_options(
                station.clone(),
                rows.iter().map(|&i| column[i]),
            ))
        })
        .collect()
}
