//! Israeli Transverse Mercator (EPSG:2039) to WGS84 conversion.
//!
//! ITM is a Transverse Mercator projection on the GRS80 ellipsoid (datum
//! "Israel 1993"). Converting to WGS84 takes two steps:
//!
//! 1. Inverse Transverse Mercator, using Krüger's series to sixth order in
//!    the third flattening (sub-millimetre within the projection's extent).
//! 2. A seven-parameter Helmert shift between the two datums, applied in
//!    geocentric Cartesian coordinates.
//!
//! [`project_to_planar`] runs the same steps in reverse.

use std::sync::LazyLock;

use air_quality_geo_models::{GeoPoint, ProjectedPoint};

use crate::GeoError;

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Maximum Newton iterations when recovering latitude from the conformal
/// latitude. Converges in two or three for any realistic input.
const MAX_LATITUDE_ITERATIONS: usize = 6;

/// A reference ellipsoid.
#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    /// Semi-major axis in metres.
    a: f64,
    /// Flattening.
    f: f64,
}

impl Ellipsoid {
    const GRS80: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    const WGS84: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// First eccentricity squared.
    fn e2(self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Geodetic latitude/longitude (radians, on the ellipsoid surface) to
    /// geocentric Cartesian coordinates.
    fn to_ecef(self, lat: f64, lon: f64) -> [f64; 3] {
        let e2 = self.e2();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        [
            n * cos_lat * lon.cos(),
            n * cos_lat * lon.sin(),
            n * (1.0 - e2) * sin_lat,
        ]
    }

    /// Geocentric Cartesian coordinates back to geodetic latitude/longitude
    /// in radians. The ellipsoidal height is discarded.
    fn from_ecef(self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let e2 = self.e2();
        let lon = y.atan2(x);
        let p = x.hypot(y);

        let mut lat = z.atan2(p * (1.0 - e2));
        for _ in 0..10 {
            let sin_lat = lat.sin();
            let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let h = p / lat.cos() - n;
            let next = z.atan2(p * (1.0 - e2 * n / (n + h)));
            let done = (next - lat).abs() < 1e-15;
            lat = next;
            if done {
                break;
            }
        }

        (lat, lon)
    }
}

/// Seven-parameter similarity transform in the position-vector convention
/// (the convention of PROJ's `+towgs84`).
#[derive(Debug, Clone, Copy)]
struct Helmert {
    /// Translation in metres.
    translation: [f64; 3],
    /// Rotation about X, Y, Z in radians.
    rotation: [f64; 3],
    /// Scale difference (unitless, not ppm).
    scale: f64,
}

impl Helmert {
    /// Israel 1993 to WGS84.
    const ISRAEL_1993_TO_WGS84: Self = Self {
        translation: [-24.0024, -17.1032, -17.8444],
        rotation: [
            -0.33077 * ARCSEC_TO_RAD,
            -1.85269 * ARCSEC_TO_RAD,
            1.66969 * ARCSEC_TO_RAD,
        ],
        scale: 5.4248e-6,
    };

    /// Small-angle rotation matrix applied to `p`, minus the identity.
    fn rotate_delta(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let [rx, ry, rz] = self.rotation;
        [-rz * y + ry * z, rz * x - rx * z, -ry * x + rx * y]
    }

    fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let k = 1.0 + self.scale;
        let d = self.rotate_delta(p);
        [
            self.translation[0] + k * (p[0] + d[0]),
            self.translation[1] + k * (p[1] + d[1]),
            self.translation[2] + k * (p[2] + d[2]),
        ]
    }

    /// Exact inverse of [`Self::apply`].
    ///
    /// Solves `(I + R) p = u` by fixed-point iteration; the rotation terms
    /// are ~1e-5 so four rounds reach machine precision.
    fn invert(&self, q: [f64; 3]) -> [f64; 3] {
        let k = 1.0 + self.scale;
        let u = [
            (q[0] - self.translation[0]) / k,
            (q[1] - self.translation[1]) / k,
            (q[2] - self.translation[2]) / k,
        ];

        let mut p = u;
        for _ in 0..4 {
            let d = self.rotate_delta(p);
            p = [u[0] - d[0], u[1] - d[1], u[2] - d[2]];
        }
        p
    }
}

/// A Transverse Mercator projection evaluated with Krüger's n-series.
#[derive(Debug, Clone)]
struct TransverseMercator {
    ellipsoid: Ellipsoid,
    /// Central meridian in radians.
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// First eccentricity.
    e: f64,
    /// Rectifying radius `A`.
    rectifying_radius: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    /// Conformal-sphere northing of the latitude of origin.
    xi0: f64,
}

impl TransverseMercator {
    #[allow(clippy::suboptimal_flops)]
    fn new(
        ellipsoid: Ellipsoid,
        lat0_deg: f64,
        lon0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let f = ellipsoid.f;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let rectifying_radius =
            ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1_983_433.0 * n6 / 1_935_360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
                + 167_603.0 * n6 / 181_440.0,
            49561.0 * n4 / 161_280.0 - 179.0 * n5 / 168.0 + 6_601_661.0 * n6 / 7_257_600.0,
            34729.0 * n5 / 80640.0 - 3_418_889.0 * n6 / 1_995_840.0,
            212_378_941.0 * n6 / 319_334_400.0,
        ];

        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
                + 96199.0 * n6 / 604_800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
                - 1_118_711.0 * n6 / 3_870_720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161_280.0 - 11.0 * n5 / 504.0 - 830_251.0 * n6 / 7_257_600.0,
            4583.0 * n5 / 161_280.0 - 108_847.0 * n6 / 3_991_680.0,
            20_648_693.0 * n6 / 638_668_800.0,
        ];

        let mut tm = Self {
            ellipsoid,
            lon0: lon0_deg.to_radians(),
            k0,
            false_easting,
            false_northing,
            e: ellipsoid.e2().sqrt(),
            rectifying_radius,
            alpha,
            beta,
            xi0: 0.0,
        };
        tm.xi0 = tm.xi_eta(lat0_deg.to_radians(), 0.0).0;
        tm
    }

    /// Israeli Transverse Mercator.
    fn itm() -> Self {
        Self::new(
            Ellipsoid::GRS80,
            31.734_393_611_111_1,
            35.204_516_944_444_4,
            1.000_006_7,
            219_529.584,
            626_907.39,
        )
    }

    /// Conformal latitude tangent `tau'` for a geodetic latitude tangent.
    fn tau_prime(&self, tau: f64) -> f64 {
        let tau1 = tau.hypot(1.0);
        let sigma = (self.e * (self.e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Gauss-Krüger `(xi, eta)` for a latitude and a longitude offset from
    /// the central meridian, both in radians.
    fn xi_eta(&self, lat: f64, dlon: f64) -> (f64, f64) {
        let tp = self.tau_prime(lat.tan());
        let cos_l = dlon.cos();
        let xi_p = tp.atan2(cos_l);
        let eta_p = (dlon.sin() / tp.hypot(cos_l)).asinh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in (1..=6_u8).zip(self.alpha) {
            let k = 2.0 * f64::from(j);
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }
        (xi, eta)
    }

    /// Geodetic radians to planar metres.
    fn forward(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (xi, eta) = self.xi_eta(lat, lon - self.lon0);
        let scale = self.k0 * self.rectifying_radius;
        (
            self.false_easting + scale * eta,
            self.false_northing + scale * (xi - self.xi0),
        )
    }

    /// Planar metres to geodetic radians.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.k0 * self.rectifying_radius;
        let xi = (y - self.false_northing) / scale + self.xi0;
        let eta = (x - self.false_easting) / scale;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in (1..=6_u8).zip(self.beta) {
            let k = 2.0 * f64::from(j);
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let tau_p = xi_p.sin() / eta_p.sinh().hypot(xi_p.cos());
        let dlon = eta_p.sinh().atan2(xi_p.cos());

        let one_minus_e2 = 1.0 - self.ellipsoid.e2();
        let mut tau = tau_p;
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let tp = self.tau_prime(tau);
            let step = (tau_p - tp) / tp.hypot(1.0) * one_minus_e2.mul_add(tau * tau, 1.0)
                / (one_minus_e2 * tau.hypot(1.0));
            tau += step;
            if step.abs() < 1e-14 {
                break;
            }
        }

        (tau.atan(), dlon + self.lon0)
    }
}

static ITM: LazyLock<TransverseMercator> = LazyLock::new(TransverseMercator::itm);

/// Converts an EPSG:2039 planar coordinate to WGS84.
///
/// The coordinate is not checked against Israel's extent; any finite pair
/// is transformed.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] if either component is NaN or
/// infinite.
pub fn project_to_geographic(x: f64, y: f64) -> Result<GeoPoint, GeoError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(GeoError::InvalidCoordinate { x, y });
    }

    let (lat, lon) = ITM.inverse(x, y);
    let local = Ellipsoid::GRS80.to_ecef(lat, lon);
    let shifted = Helmert::ISRAEL_1993_TO_WGS84.apply(local);
    let (lat, lon) = Ellipsoid::WGS84.from_ecef(shifted);

    Ok(GeoPoint::new(lat.to_degrees(), lon.to_degrees()))
}

/// Converts a [`ProjectedPoint`] to WGS84.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] if either component is NaN or
/// infinite.
pub fn project_point(point: ProjectedPoint) -> Result<GeoPoint, GeoError> {
    project_to_geographic(point.x, point.y)
}

/// Converts a WGS84 point back to EPSG:2039. Inverse of
/// [`project_to_geographic`].
///
/// # Errors
///
/// Returns [`GeoError::InvalidGeoPoint`] if the point is non-finite or
/// outside the valid latitude/longitude range.
pub fn project_to_planar(point: GeoPoint) -> Result<ProjectedPoint, GeoError> {
    let GeoPoint {
        latitude,
        longitude,
    } = point;
    if !point.is_finite() || latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return Err(GeoError::InvalidGeoPoint {
            latitude,
            longitude,
        });
    }

    let global = Ellipsoid::WGS84.to_ecef(latitude.to_radians(), longitude.to_radians());
    let local = Helmert::ISRAEL_1993_TO_WGS84.invert(global);
    let (lat, lon) = Ellipsoid::GRS80.from_ecef(local);
    let (x, y) = ITM.forward(lat, lon);

    Ok(ProjectedPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_origin_lands_near_projection_origin() {
        let p = project_to_geographic(219_529.584, 626_907.39).unwrap();
        // Datum shift moves the origin by a few tens of metres.
        assert!((p.latitude - 31.734_764).abs() < 1e-5, "{p:?}");
        assert!((p.longitude - 35.205_208).abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn tel_aviv_grid_point_converts() {
        let p = project_to_geographic(180_000.0, 665_000.0).unwrap();
        assert!((p.latitude - 32.077_607).abs() < 1e-5, "{p:?}");
        assert!((p.longitude - 34.786_527).abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn round_trip_reproduces_planar_input() {
        for (x, y) in [
            (219_529.584, 626_907.39),
            (180_000.0, 665_000.0),
            (250_000.0, 750_000.0),
            (150_000.0, 400_000.0),
            (200_000.0, 600_000.0),
        ] {
            let geo = project_to_geographic(x, y).unwrap();
            let back = project_to_planar(geo).unwrap();
            assert!((back.x - x).abs() < 1e-4, "x {x} -> {}", back.x);
            assert!((back.y - y).abs() < 1e-4, "y {y} -> {}", back.y);
        }
    }

    #[test]
    fn round_trip_reproduces_geographic_input() {
        let original = GeoPoint::new(32.0853, 34.7818);
        let planar = project_to_planar(original).unwrap();
        let back = project_point(planar).unwrap();
        assert!((back.latitude - original.latitude).abs() < 1e-6);
        assert!((back.longitude - original.longitude).abs() < 1e-6);
    }

    #[test]
    fn transverse_mercator_forward_inverse_agree() {
        let tm = TransverseMercator::itm();
        let (lat, lon) = tm.inverse(240_000.0, 700_000.0);
        let (x, y) = tm.forward(lat, lon);
        assert!((x - 240_000.0).abs() < 1e-6);
        assert!((y - 700_000.0).abs() < 1e-6);
    }

    #[test]
    fn helmert_invert_undoes_apply() {
        let helmert = Helmert::ISRAEL_1993_TO_WGS84;
        let p = Ellipsoid::GRS80.to_ecef(0.55, 0.61);
        let q = helmert.invert(helmert.apply(p));
        for i in 0..3 {
            assert!((p[i] - q[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn non_finite_planar_input_is_rejected() {
        assert!(matches!(
            project_to_geographic(f64::NAN, 600_000.0),
            Err(GeoError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            project_to_geographic(200_000.0, f64::INFINITY),
            Err(GeoError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn out_of_range_geographic_input_is_rejected() {
        assert!(matches!(
            project_to_planar(GeoPoint::new(91.0, 35.0)),
            Err(GeoError::InvalidGeoPoint { .. })
        ));
        assert!(matches!(
            project_to_planar(GeoPoint::new(32.0, f64::NAN)),
            Err(GeoError::InvalidGeoPoint { .. })
        ));
    }
}
