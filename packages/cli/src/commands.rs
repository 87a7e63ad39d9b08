//! One function per subcommand. Shared by the flag-driven and interactive
//! front ends.

use std::str::FromStr as _;

use air_quality_analytics::{hour_weekday_pivot, monthly_aggregates, pollutant_correlations};
use air_quality_analytics_models::{Aggregate, MonthlyAggregateParams};
use air_quality_data::{DataStore, samples};
use air_quality_geo::map::proximity_map;
use air_quality_geo::{nearby, project_to_geographic, sorted_by_distance};
use air_quality_geo_models::Pollutant;
use air_quality_stats::compare_samples_with;
use air_quality_stats_models::PValueMethod;
use serde::Serialize;

use crate::format;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Prints `value` as pretty JSON or as the text rendering.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> CommandResult {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

/// Radius to search with, falling back to the configured default.
///
/// # Errors
///
/// Returns an error if the radius is negative or not finite.
pub fn resolve_radius(store: &DataStore, radius_km: Option<f64>) -> Result<f64, String> {
    let radius = radius_km.unwrap_or(store.config().default_radius_km);
    if radius.is_finite() && radius >= 0.0 {
        Ok(radius)
    } else {
        Err(format!("Radius must be a non-negative number of km, got {radius}"))
    }
}

pub fn project(x: f64, y: f64, json: bool) -> CommandResult {
    let point = project_to_geographic(x, y)?;
    emit(json, &point, |p| {
        format!("{:.6}, {:.6}\n", p.latitude, p.longitude)
    })
}

pub fn stations(store: &DataStore, json: bool) -> CommandResult {
    let stations = store.stations()?;
    emit(json, &*stations, |s| format::stations(s))
}

pub fn nearby_stations(
    store: &DataStore,
    city: &str,
    radius_km: Option<f64>,
    geojson: bool,
    json: bool,
) -> CommandResult {
    let radius = resolve_radius(store, radius_km)?;
    let city = store
        .city(city)?
        .ok_or_else(|| format!("Unknown city '{city}'"))?;
    let stations = store.stations()?;

    let results = sorted_by_distance(nearby(city.location, &stations, radius));
    log::info!(
        "{} of {} station(s) within {radius} km of {}",
        results.len(),
        stations.len(),
        city.name
    );

    if geojson {
        println!("{}", proximity_map(&city, &stations, &results));
        return Ok(());
    }

    emit(json, &results, |r| format::nearby(&city.name, radius, r))
}

pub fn seasons(
    store: &DataStore,
    pollutant: Pollutant,
    method: PValueMethod,
    json: bool,
) -> CommandResult {
    let table = store.seasons()?;
    let samples = samples::season_samples(&table, pollutant)?;
    let report = compare_samples_with(&samples, method);
    emit(json, &report, format::comparison)
}

pub fn pollutants(
    store: &DataStore,
    pollutants: &[Pollutant],
    method: PValueMethod,
    json: bool,
) -> CommandResult {
    let table = store.seasons()?;
    let samples = samples::pollutant_samples(&table, pollutants)?;
    let report = compare_samples_with(&samples, method);
    emit(json, &report, format::comparison)
}

pub fn monthly(
    store: &DataStore,
    pollutant: Pollutant,
    params: &MonthlyAggregateParams,
    json: bool,
) -> CommandResult {
    let table = store.pollutant(pollutant)?;
    let result = monthly_aggregates(&table, params)?;
    emit(json, &result, format::monthly)
}

pub fn profile(store: &DataStore, pollutant: Pollutant, json: bool) -> CommandResult {
    let table = store.seasons()?;
    let pivot = hour_weekday_pivot(&table, pollutant)?;
    emit(json, &pivot, format::pivot)
}

/// Correlates the given pollutants, or every configured pollutant the
/// seasonal table has a column for.
pub fn correlations(store: &DataStore, pollutants: &[Pollutant], json: bool) -> CommandResult {
    let table = store.seasons()?;
    let selected: Vec<Pollutant> = if pollutants.is_empty() {
        store
            .config()
            .pollutants
            .iter()
            .copied()
            .filter(|p| table.pollutant(*p).is_some())
            .collect()
    } else {
        pollutants.to_vec()
    };

    let matrix = pollutant_correlations(&table, &selected)?;
    emit(json, &matrix, format::correlations)
}

pub fn config(store: &DataStore) -> CommandResult {
    print!("{}", store.config().to_toml_string()?);
    Ok(())
}

/// Builds monthly parameters from loosely typed input.
///
/// # Errors
///
/// Returns an error if no station is given.
pub fn monthly_params(
    stations: Vec<String>,
    from: Option<String>,
    to: Option<String>,
    max: bool,
) -> Result<MonthlyAggregateParams, String> {
    let stations: Vec<String> = stations
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if stations.is_empty() {
        return Err("At least one station is required".to_string());
    }

    Ok(MonthlyAggregateParams {
        stations,
        date_from: from,
        date_to: to,
        aggregate: if max { Aggregate::Max } else { Aggregate::Mean },
    })
}

/// Parses a comma-separated pollutant list such as `"O3, PM2.5"`.
///
/// # Errors
///
/// Returns an error naming the first entry that is not a pollutant.
pub fn parse_pollutant_list(s: &str) -> Result<Vec<Pollutant>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Pollutant::from_str(p).map_err(|_| format!("Unknown pollutant '{p}'")))
        .collect()
}

#[cfg(test)]
mod tests {
    use air_quality_data::DatasetConfig;

    use super::*;

    fn store() -> DataStore {
        DataStore::new(DatasetConfig {
            default_radius_km: 12.5,
            ..DatasetConfig::default()
        })
    }

    #[test]
    fn radius_defaults_to_config() {
        let store = store();
        assert!((resolve_radius(&store, None).unwrap() - 12.5).abs() < f64::EPSILON);
        assert!((resolve_radius(&store, Some(0.0)).unwrap()).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_or_nan_radius_is_rejected() {
        let store = store();
        assert!(resolve_radius(&store, Some(-1.0)).is_err());
        assert!(resolve_radius(&store, Some(f64::NAN)).is_err());
    }

    #[test]
    fn monthly_params_require_a_station() {
        assert!(monthly_params(vec![" ".to_string()], None, None, false).is_err());

        let params = monthly_params(vec![" A ".to_string()], None, None, true).unwrap();
        assert_eq!(params.stations, vec!["A"]);
        assert_eq!(params.aggregate, Aggregate::Max);
    }

    #[test]
    fn parses_pollutant_lists() {
        assert_eq!(
            parse_pollutant_list("O3, PM2.5,,NOx").unwrap(),
            vec![Pollutant::O3, Pollutant::PM25, Pollutant::NOx]
        );
        assert!(parse_pollutant_list("O3,CO2").is_err());
    }

    #[test]
    fn project_rejects_non_finite_input() {
        assert!(project(f64::NAN, 0.0, true).is_err());
    }
}
