//! Time-indexed measurement tables.
//!
//! A measurement table has one timestamp column and any number of numeric
//! columns (one per station in the per-pollutant exports, one per pollutant
//! in the seasonal export). Blank or non-numeric cells become `None`.

use std::io::Read;
use std::str::FromStr;

use air_quality_geo_models::Pollutant;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};

use crate::DataError;

/// Timestamp formats accepted in the datetime column, tried in order.
/// Day-first for slashed dates, matching the exports.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parses a timestamp cell.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a numeric cell. Blank, non-numeric and NaN cells are missing.
#[must_use]
pub fn parse_value(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Which non-timestamp columns become value columns.
#[derive(Debug, Clone, Copy)]
pub enum ValueColumns<'a> {
    /// Every column except the timestamp and the listed ones.
    AllExcept(&'a [String]),
    /// Only the listed columns, in the listed order.
    Only(&'a [String]),
}

/// A timestamped table of numeric columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    timestamps: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl MeasurementTable {
    /// Reads a table from CSV.
    ///
    /// # Errors
    ///
    /// * [`DataError::MissingColumn`] if the timestamp column or an
    ///   `Only` column is absent.
    /// * [`DataError::InvalidDateTime`] if a timestamp does not parse.
    /// * [`DataError::Csv`] on malformed CSV.
    pub fn from_reader<R: Read>(
        reader: R,
        table: &str,
        datetime_column: &str,
        value_columns: ValueColumns<'_>,
    ) -> Result<Self, DataError> {
        let (parsed, _) = read_csv(reader, table, datetime_column, value_columns, None)?;
        Ok(parsed)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    #[must_use]
    pub fn year(&self, row: usize) -> Option<i32> {
        self.timestamps.get(row).map(Datelike::year)
    }

    /// Month of `row`, 1 to 12.
    #[must_use]
    pub fn month(&self, row: usize) -> Option<u32> {
        self.timestamps.get(row).map(Datelike::month)
    }

    /// Hour of day of `row`, 0 to 23.
    #[must_use]
    pub fn hour(&self, row: usize) -> Option<u32> {
        self.timestamps.get(row).map(Timelike::hour)
    }

    #[must_use]
    pub fn weekday(&self, row: usize) -> Option<Weekday> {
        self.timestamps.get(row).map(Datelike::weekday)
    }

    /// Value column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Value column names sorted alphabetically.
    #[must_use]
    pub fn sorted_column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.column_names().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Earliest and latest timestamps.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.timestamps.iter().min()?;
        let max = self.timestamps.iter().max()?;
        Some((*min, *max))
    }

    /// Row indices whose timestamp falls on or between the given dates.
    /// Either bound may be open.
    #[must_use]
    pub fn rows_between(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Vec<usize> {
        self.timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| {
                let date = ts.date();
                from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// The seasonal table: one column per pollutant plus a season label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonTable {
    pub measurements: MeasurementTable,
    pub seasons: Vec<String>,
}

impl SeasonTable {
    /// Reads the seasonal CSV. Pollutant columns are matched by any
    /// accepted spelling (`PM25`, `PM2.5`, ...) and renamed to the canonical
    /// name.
    ///
    /// # Errors
    ///
    /// * [`DataError::MissingColumn`] if the timestamp or season column is
    ///   absent.
    /// * [`DataError::InvalidDateTime`] if a timestamp does not parse.
    /// * [`DataError::Csv`] on malformed CSV.
    pub fn from_reader<R: Read>(
        reader: R,
        table: &str,
        datetime_column: &str,
        season_column: &str,
    ) -> Result<Self, DataError> {
        let (measurements, seasons) = read_csv(
            reader,
            table,
            datetime_column,
            ValueColumns::AllExcept(&[]),
            Some(season_column),
        )?;

        let columns = measurements
            .columns
            .into_iter()
            .filter_map(|(name, values)| {
                Pollutant::from_str(&name)
                    .ok()
                    .map(|p| (p.to_string(), values))
            })
            .collect();

        Ok(Self {
            measurements: MeasurementTable {
                timestamps: measurements.timestamps,
                columns,
            },
            seasons: seasons.unwrap_or_default(),
        })
    }

    /// Distinct season labels in order of first appearance.
    #[must_use]
    pub fn season_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for season in &self.seasons {
            if !labels.contains(&season.as_str()) {
                labels.push(season);
            }
        }
        labels
    }

    /// Values of one pollutant column.
    #[must_use]
    pub fn pollutant(&self, pollutant: Pollutant) -> Option<&[Option<f64>]> {
        self.measurements.column(pollutant.as_ref())
    }
}

type ParsedCsv = (MeasurementTable, Option<Vec<String>>);

fn read_csv<R: Read>(
    reader: R,
    table: &str,
    datetime_column: &str,
    value_columns: ValueColumns<'_>,
    label_column: Option<&str>,
) -> Result<ParsedCsv, DataError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let find = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| DataError::MissingColumn {
                column: column.to_string(),
                table: table.to_string(),
            })
    };

    let datetime_idx = find(datetime_column)?;
    let label_idx = label_column.map(&find).transpose()?;

    let selected: Vec<(usize, String)> = match value_columns {
        ValueColumns::Only(names) => names
            .iter()
            .map(|name| find(name.as_str()).map(|i| (i, name.clone())))
            .collect::<Result<_, _>>()?,
        ValueColumns::AllExcept(skip) => headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != datetime_idx
                    && Some(*i) != label_idx
                    && !h.is_empty()
                    && !skip.contains(*h)
            })
            .map(|(i, h)| (i, h.clone()))
            .collect(),
    };

    let mut timestamps = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); selected.len()];
    let mut labels = label_idx.map(|_| Vec::new());
    let mut missing = 0_usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw = record.get(datetime_idx).unwrap_or("");
        let ts = parse_datetime(raw).ok_or_else(|| DataError::InvalidDateTime {
            value: raw.to_string(),
            row: row + 1,
        })?;
        timestamps.push(ts);

        for ((idx, _), column) in selected.iter().zip(values.iter_mut()) {
            let value = record.get(*idx).and_then(parse_value);
            if value.is_none() {
                missing += 1;
            }
            column.push(value);
        }

        if let (Some(idx), Some(labels)) = (label_idx, labels.as_mut()) {
            labels.push(record.get(idx).unwrap_or("").trim().to_string());
        }
    }

    log::info!(
        "Parsed {} rows x {} columns from {table} ({missing} missing cells)",
        timestamps.len(),
        selected.len()
    );

    let columns = selected
        .into_iter()
        .map(|(_, name)| name)
        .zip(values)
        .collect();

    Ok((
        MeasurementTable {
            timestamps,
            columns,
        },
        labels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const O3_CSV: &str = "\
תאריך ושעה,Antokolsky,Yad Avner,month,year
2020-01-01 01:00,10.5,,1,2020
2020-01-01 02:00,11,12.5,1,2020
2020-02-15 13:00,abc,14,2,2020
";

    const SEASON_CSV: &str = "\
תאריך ושעה,PM2.5,O3,NOx,Season,month,year
01/01/2020 00:00,5,30,10,Winter,1,2020
01/07/2020 12:00,7,45,,Summer,7,2020
02/01/2020 06:00,6,28,12,Winter,1,2020
";

    fn ignored() -> Vec<String> {
        vec!["month".to_string(), "year".to_string()]
    }

    #[test]
    fn parses_supported_datetime_formats() {
        let a = parse_datetime("2020-03-04 05:06:07").unwrap();
        assert_eq!((a.year(), a.month(), a.day(), a.hour()), (2020, 3, 4, 5));

        let b = parse_datetime("04/03/2020 05:06").unwrap();
        assert_eq!((b.month(), b.day()), (3, 4));

        let c = parse_datetime("2020-03-04").unwrap();
        assert_eq!(c.hour(), 0);

        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn parse_value_treats_blank_and_text_as_missing() {
        assert_eq!(parse_value(" 1.5 "), Some(1.5));
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("n/a"), None);
        assert_eq!(parse_value("NaN"), None);
    }

    #[test]
    fn reads_pollutant_table_with_station_columns() {
        let ignored = ignored();
        let table = MeasurementTable::from_reader(
            O3_CSV.as_bytes(),
            "O3",
            "תאריך ושעה",
            ValueColumns::AllExcept(&ignored),
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["Antokolsky", "Yad Avner"]
        );
        assert_eq!(
            table.column("Antokolsky").unwrap(),
            &[Some(10.5), Some(11.0), None]
        );
        assert_eq!(
            table.column("Yad Avner").unwrap(),
            &[None, Some(12.5), Some(14.0)]
        );
        assert!(table.column("month").is_none());
    }

    #[test]
    fn only_selection_requires_columns() {
        let only = vec!["Missing".to_string()];
        let err = MeasurementTable::from_reader(
            O3_CSV.as_bytes(),
            "O3",
            "תאריך ושעה",
            ValueColumns::Only(&only),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column, .. } if column == "Missing"));
    }

    #[test]
    fn bad_timestamp_reports_row() {
        let csv = "ts,a\n2020-01-01 00:00,1\nnot a date,2\n";
        let err =
            MeasurementTable::from_reader(csv.as_bytes(), "t", "ts", ValueColumns::AllExcept(&[]))
                .unwrap_err();
        assert!(matches!(err, DataError::InvalidDateTime { row: 2, .. }));
    }

    #[test]
    fn calendar_accessors_follow_timestamps() {
        let ignored = ignored();
        let table = MeasurementTable::from_reader(
            O3_CSV.as_bytes(),
            "O3",
            "תאריך ושעה",
            ValueColumns::AllExcept(&ignored),
        )
        .unwrap();

        assert_eq!(table.year(2), Some(2020));
        assert_eq!(table.month(2), Some(2));
        assert_eq!(table.hour(2), Some(13));
        assert_eq!(table.weekday(0), Some(Weekday::Wed));
        assert_eq!(table.weekday(2), Some(Weekday::Sat));
        assert_eq!(table.hour(3), None);
    }

    #[test]
    fn rows_between_is_inclusive_on_dates() {
        let ignored = ignored();
        let table = MeasurementTable::from_reader(
            O3_CSV.as_bytes(),
            "O3",
            "תאריך ושעה",
            ValueColumns::AllExcept(&ignored),
        )
        .unwrap();

        let jan1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(table.rows_between(Some(jan1), Some(jan1)), vec![0, 1]);
        assert_eq!(table.rows_between(None, None), vec![0, 1, 2]);

        let (min, max) = table.date_range().unwrap();
        assert_eq!(min.date(), jan1);
        assert_eq!(max.month(), 2);
    }

    #[test]
    fn reads_season_table_with_canonical_pollutant_names() {
        let table =
            SeasonTable::from_reader(SEASON_CSV.as_bytes(), "seasons", "תאריך ושעה", "Season")
                .unwrap();

        assert_eq!(table.season_labels(), vec!["Winter", "Summer"]);
        assert_eq!(
            table.pollutant(Pollutant::PM25).unwrap(),
            &[Some(5.0), Some(7.0), Some(6.0)]
        );
        assert_eq!(
            table.pollutant(Pollutant::NOx).unwrap(),
            &[Some(10.0), None, Some(12.0)]
        );
        assert!(table.pollutant(Pollutant::SO2).is_none());
        // `month`/`year` are not pollutants and are dropped.
        assert_eq!(table.measurements.column_names().count(), 3);
    }

    #[test]
    fn missing_season_column_is_an_error() {
        let err = SeasonTable::from_reader(O3_CSV.as_bytes(), "O3", "תאריך ושעה", "Season")
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column, .. } if column == "Season"));
    }
}
