//! Cached access to every table of one dataset.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use air_quality_geo_models::{City, Pollutant, Station};

use crate::locations::{load_cities_file, load_stations_file};
use crate::measurements::ValueColumns;
use crate::{DataCache, DataError, DatasetConfig, MeasurementTable, SeasonTable};

/// Loads tables on first access and reloads them when their files change.
#[derive(Debug)]
pub struct DataStore {
    config: DatasetConfig,
    stations: DataCache<Vec<Station>>,
    cities: DataCache<Vec<City>>,
    seasons: DataCache<SeasonTable>,
    pollutants: Mutex<BTreeMap<Pollutant, Arc<DataCache<MeasurementTable>>>>,
}

impl DataStore {
    #[must_use]
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            stations: DataCache::new(config.stations_path()),
            cities: DataCache::new(config.cities_path()),
            seasons: DataCache::new(config.season_path()),
            pollutants: Mutex::new(BTreeMap::new()),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// All stations with usable coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the station table cannot be read or parsed.
    pub fn stations(&self) -> Result<Arc<Vec<Station>>, DataError> {
        self.stations
            .get_or_load(|path| load_stations_file(path, &self.config.columns))
    }

    /// All cities with usable coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the city table cannot be read or parsed.
    pub fn cities(&self) -> Result<Arc<Vec<City>>, DataError> {
        self.cities
            .get_or_load(|path| load_cities_file(path, &self.config.columns))
    }

    /// Looks a city up by exact name, falling back to a case-insensitive
    /// match.
    ///
    /// # Errors
    ///
    /// Returns an error if the city table cannot be read or parsed.
    pub fn city(&self, name: &str) -> Result<Option<City>, DataError> {
        let cities = self.cities()?;
        let name = name.trim();
        Ok(cities
            .iter()
            .find(|c| c.name == name)
            .or_else(|| cities.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
            .cloned())
    }

    /// The seasonal table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read or parsed.
    pub fn seasons(&self) -> Result<Arc<SeasonTable>, DataError> {
        let columns = &self.config.columns;
        self.seasons.get_or_load(|path| {
            SeasonTable::from_reader(
                std::fs::File::open(path)?,
                &path.display().to_string(),
                &columns.datetime,
                &columns.season,
            )
        })
    }

    /// The per-station table for one pollutant.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be read or parsed.
    pub fn pollutant(&self, pollutant: Pollutant) -> Result<Arc<MeasurementTable>, DataError> {
        let cache = {
            let mut caches = self
                .pollutants
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(caches.entry(pollutant).or_insert_with(|| {
                Arc::new(DataCache::new(self.config.pollutant_path(pollutant)))
            }))
        };

        let columns = &self.config.columns;
        cache.get_or_load(|path| {
            MeasurementTable::from_reader(
                std::fs::File::open(path)?,
                &path.display().to_string(),
                &columns.datetime,
                ValueColumns::AllExcept(&columns.ignored),
            )
        })
    }

    /// Drops every cached table.
    pub fn invalidate(&self) {
        self.stations.invalidate();
        self.cities.invalidate();
        self.seasons.invalidate();
        self.pollutants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        log::debug!("Invalidated all cached tables");
    }
}
