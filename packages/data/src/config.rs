//! Dataset layout configuration.
//!
//! A [`DatasetConfig`] names the files and columns of one export. The
//! defaults describe the Hebrew-headed CSVs published by the national
//! monitoring network; `config/default.toml` is the same layout written out
//! as a template. Every field is optional in TOML and falls back to its
//! default.

use std::path::{Path, PathBuf};

use air_quality_geo_models::Pollutant;
use serde::{Deserialize, Serialize};

use crate::DataError;

/// The embedded template, identical to [`DatasetConfig::default`].
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Placeholder substituted in [`DatasetConfig::pollutant_file_pattern`].
const POLLUTANT_PLACEHOLDER: &str = "{pollutant}";

/// Column names used by the CSV exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub station_name: String,
    pub station_x: String,
    pub station_y: String,
    pub city_name: String,
    pub city_x: String,
    pub city_y: String,
    /// Timestamp column in measurement tables.
    pub datetime: String,
    /// Season label column in the seasonal table.
    pub season: String,
    /// Columns in measurement tables that are not readings.
    pub ignored: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            station_name: "שם התחנה החדש".to_string(),
            station_x: "X".to_string(),
            station_y: "Y".to_string(),
            city_name: "יישוב".to_string(),
            city_x: "x".to_string(),
            city_y: "y".to_string(),
            datetime: "תאריך ושעה".to_string(),
            season: "Season".to_string(),
            ignored: vec!["month".to_string(), "year".to_string()],
        }
    }
}

/// Where the dataset lives and how it is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub stations_file: String,
    pub cities_file: String,
    pub season_file: String,
    /// File name pattern for per-pollutant tables, containing `{pollutant}`.
    pub pollutant_file_pattern: String,
    /// Pollutants with a per-pollutant table.
    pub pollutants: Vec<Pollutant>,
    /// Radius used by proximity search when the caller gives none.
    pub default_radius_km: f64,
    pub columns: ColumnNames,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Data"),
            stations_file: "stations.csv".to_string(),
            cities_file: "cities.csv".to_string(),
            season_file: "season_data.csv".to_string(),
            pollutant_file_pattern: "{pollutant}_raw_data.csv".to_string(),
            pollutants: Pollutant::all().to_vec(),
            default_radius_km: 20.0,
            columns: ColumnNames::default(),
        }
    }
}

impl DatasetConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Config`] if the document is not valid TOML or a
    /// value has the wrong type.
    pub fn from_toml_str(s: &str) -> Result<Self, DataError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] if the file cannot be read, or
    /// [`DataError::Config`] if it does not parse.
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loaded dataset config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[must_use]
    pub fn stations_path(&self) -> PathBuf {
        self.data_dir.join(&self.stations_file)
    }

    #[must_use]
    pub fn cities_path(&self) -> PathBuf {
        self.data_dir.join(&self.cities_file)
    }

    #[must_use]
    pub fn season_path(&self) -> PathBuf {
        self.data_dir.join(&self.season_file)
    }

    /// Path of the per-pollutant table, e.g. `Data/O3_raw_data.csv`.
    #[must_use]
    pub fn pollutant_path(&self, pollutant: Pollutant) -> PathBuf {
        let file = self
            .pollutant_file_pattern
            .replace(POLLUTANT_PLACEHOLDER, pollutant.as_ref());
        self.data_dir.join(file)
    }
}
