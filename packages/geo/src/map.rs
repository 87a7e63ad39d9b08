//! `GeoJSON` export of a reference city and the stations around it.
//!
//! The output is a plain `FeatureCollection` of points that any map front
//! end can render. Each feature carries a `kind` property (`"city"`,
//! `"nearby_station"` or `"station"`) so the renderer can style them apart.

use std::collections::BTreeMap;

use air_quality_geo_models::{City, DistanceResult, GeoPoint, Station};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

/// `kind` property value for a reference city.
pub const KIND_CITY: &str = "city";
/// `kind` property value for a station within the search radius.
pub const KIND_NEARBY_STATION: &str = "nearby_station";
/// `kind` property value for a station outside the search radius.
pub const KIND_STATION: &str = "station";

fn point_feature(location: GeoPoint, properties: JsonObject) -> Feature {
    let point: geo::Point<f64> = location.into();
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(&point))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Builds a feature collection with the city first, followed by every
/// station. Stations listed in `nearby` get their distance attached.
#[must_use]
pub fn proximity_map(
    city: &City,
    stations: &[Station],
    nearby: &[DistanceResult],
) -> FeatureCollection {
    let distances: BTreeMap<&str, f64> = nearby
        .iter()
        .map(|r| (r.name.as_str(), r.distance_km))
        .collect();

    let mut city_props = JsonObject::new();
    city_props.insert("name".to_string(), city.name.clone().into());
    city_props.insert("kind".to_string(), KIND_CITY.into());

    let mut features = Vec::with_capacity(stations.len() + 1);
    features.push(point_feature(city.location, city_props));

    for station in stations {
        let mut props = JsonObject::new();
        props.insert("name".to_string(), station.name.clone().into());
        props.insert("pollutants".to_string(), station.pollutant_label().into());

        if let Some(distance) = distances.get(station.name.as_str()) {
            props.insert("kind".to_string(), KIND_NEARBY_STATION.into());
            props.insert("distanceKm".to_string(), (*distance).into());
        } else {
            props.insert("kind".to_string(), KIND_STATION.into());
        }

        features.push(point_feature(station.location, props));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
