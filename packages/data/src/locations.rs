//! Station and city tables.
//!
//! Both exports carry ITM easting/northing columns. Rows with missing or
//! unparseable coordinates are dropped, the rest are projected to WGS84.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use air_quality_geo::project_to_geographic;
use air_quality_geo_models::{City, GeoPoint, Pollutant, Station};

use crate::DataError;
use crate::config::ColumnNames;
use crate::measurements::parse_value;

struct Columns {
    name: usize,
    x: usize,
    y: usize,
}

fn header_index(headers: &[String], column: &str, table: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DataError::MissingColumn {
            column: column.to_string(),
            table: table.to_string(),
        })
}

fn trimmed_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>, DataError> {
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect())
}

fn locate(record: &csv::StringRecord, columns: &Columns, table: &str) -> Option<(String, GeoPoint)> {
    let name = record.get(columns.name)?.trim();
    let x = record.get(columns.x).and_then(parse_value)?;
    let y = record.get(columns.y).and_then(parse_value)?;

    match project_to_geographic(x, y) {
        Ok(location) => Some((name.to_string(), location)),
        Err(e) => {
            log::warn!("Dropping '{name}' from {table}: {e}");
            None
        }
    }
}

/// Reads the station table.
///
/// Any header that names a pollutant is a coverage flag: a value of `1`
/// means the station measures it.
///
/// # Errors
///
/// * [`DataError::MissingColumn`] if the name or coordinate columns are
///   absent.
/// * [`DataError::Csv`] on malformed CSV.
pub fn load_stations<R: Read>(
    reader: R,
    columns: &ColumnNames,
) -> Result<Vec<Station>, DataError> {
    const TABLE: &str = "stations";

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = trimmed_headers(&mut reader)?;
    let cols = Columns {
        name: header_index(&headers, &columns.station_name, TABLE)?,
        x: header_index(&headers, &columns.station_x, TABLE)?,
        y: header_index(&headers, &columns.station_y, TABLE)?,
    };

    let flags: Vec<(usize, Pollutant)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Pollutant::from_str(h).ok().map(|p| (i, p)))
        .collect();

    let mut stations = Vec::new();
    let mut dropped = 0_usize;

    for record in reader.records() {
        let record = record?;
        let Some((name, location)) = locate(&record, &cols, TABLE) else {
            dropped += 1;
            continue;
        };

        let pollutants: BTreeSet<Pollutant> = flags
            .iter()
            .filter(|(i, _)| {
                record
                    .get(*i)
                    .and_then(parse_value)
                    .is_some_and(|v| (v - 1.0).abs() < f64::EPSILON)
            })
            .map(|(_, p)| *p)
            .collect();

        stations.push(Station {
            name,
            location,
            pollutants,
        });
    }

    log::info!(
        "Loaded {} stations ({dropped} rows without usable coordinates)",
        stations.len()
    );

    Ok(stations)
}

/// Reads the city table.
///
/// # Errors
///
/// * [`DataError::MissingColumn`] if the name or coordinate columns are
///   absent.
/// * [`DataError::Csv`] on malformed CSV.
pub fn load_cities<R: Read>(reader: R, columns: &ColumnNames) -> Result<Vec<City>, DataError> {
    const TABLE: &str = "cities";

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = trimmed_headers(&mut reader)?;
    let cols = Columns {
        name: header_index(&headers, &columns.city_name, TABLE)?,
        x: header_index(&headers, &columns.city_x, TABLE)?,
        y: header_index(&headers, &columns.city_y, TABLE)?,
    };

    let mut cities = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some((name, location)) = locate(&record, &cols, TABLE) {
            cities.push(City { name, location });
        }
    }

    log::info!("Loaded {} cities", cities.len());

    Ok(cities)
}

/// Reads the station table from a file.
///
/// # Errors
///
/// See [`load_stations`]; also [`DataError::Io`] if the file cannot be
/// opened.
pub fn load_stations_file(path: &Path, columns: &ColumnNames) -> Result<Vec<Station>, DataError> {
    load_stations(std::fs::File::open(path)?, columns)
}

/// Reads the city table from a file.
///
/// # Errors
///
/// See [`load_cities`]; also [`DataError::Io`] if the file cannot be
/// opened.
pub fn load_cities_file(path: &Path, columns: &ColumnNames) -> Result<Vec<City>, DataError> {
    load_cities(std::fs::File::open(path)?, columns)
}
