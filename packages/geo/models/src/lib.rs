#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Station, city and coordinate types.
//!
//! Monitoring stations and cities arrive in Israeli Transverse Mercator
//! (EPSG:2039) planar coordinates and are converted once into WGS84
//! [`GeoPoint`]s. Everything here is plain data; the conversion and distance
//! math lives in `air_quality_geo`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A planar coordinate in the EPSG:2039 projection, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl ProjectedPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// `geo` uses `(x, y) = (longitude, latitude)` ordering.
impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Self::new(p.longitude, p.latitude)
    }
}

/// Measured quantities reported by monitoring stations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Pollutant {
    /// Ozone.
    O3,
    /// Nitrogen oxides.
    #[strum(to_string = "NOx", serialize = "NOX")]
    #[serde(rename = "NOx")]
    NOx,
    /// Particulate matter up to 10 µm.
    PM10,
    /// Particulate matter up to 2.5 µm.
    #[strum(to_string = "PM25", serialize = "PM2.5")]
    PM25,
    /// Sulphur dioxide.
    SO2,
    /// Ambient temperature (not a pollutant, but tabulated alongside them).
    TEMP,
}

impl Pollutant {
    /// All quantities in the order the source tables list them.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::O3,
            Self::NOx,
            Self::PM10,
            Self::PM25,
            Self::SO2,
            Self::TEMP,
        ]
    }
}

/// A monitoring station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    /// Station name. Identity is by name only.
    pub name: String,
    /// WGS84 location.
    pub location: GeoPoint,
    /// Quantities this station measures.
    pub pollutants: BTreeSet<Pollutant>,
}

impl Station {
    /// Comma-separated list of measured quantities, e.g. `"O3, NOx"`.
    #[must_use]
    pub fn pollutant_label(&self) -> String {
        self.pollutants
            .iter()
            .map(Pollutant::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A city or settlement used as a reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub name: String,
    pub location: GeoPoint,
}

/// A candidate within range of a reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResult {
    /// Name of the candidate station.
    pub name: String,
    /// Great-circle distance from the reference point in kilometres.
    pub distance_km: f64,
    /// Location of the candidate, carried for map rendering.
    pub location: GeoPoint,
}
