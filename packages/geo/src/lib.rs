#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic proximity engine.
//!
//! Converts Israeli Transverse Mercator (EPSG:2039) coordinates into WGS84
//! and answers "which stations are within N km of this city" with
//! spherical haversine distances. All functions are pure.

pub mod distance;
pub mod map;
pub mod projection;

pub use distance::{haversine_km, nearby, sorted_by_distance};
pub use projection::{project_point, project_to_geographic, project_to_planar};

use thiserror::Error;

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeoError {
    /// A planar coordinate was NaN or infinite.
    #[error("Invalid planar coordinate ({x}, {y})")]
    InvalidCoordinate {
        /// Easting as supplied.
        x: f64,
        /// Northing as supplied.
        y: f64,
    },

    /// A geographic coordinate was NaN, infinite or outside
    /// `[-90, 90] x [-180, 180]`.
    #[error("Invalid geographic coordinate ({latitude}, {longitude})")]
    InvalidGeoPoint {
        /// Latitude as supplied.
        latitude: f64,
        /// Longitude as supplied.
        longitude: f64,
    },
}
