//! Closed-form conversions between the coordinate systems found in the
//! upstream GIS tables.
//!
//! The Israeli Transverse Mercator (ITM, EPSG:2039) grid is handled with the
//! classic Snyder series on the WGS84 ellipsoid: the footprint latitude is
//! computed from the rectifying latitude via the `J1..J4` terms, then refined
//! with the sixth/fifth-order correction terms. Web Mercator (EPSG:3857) uses
//! the spherical inverse. None of the functions iterate.
//!
//! Every function returns [`TransformError::NonFinite`] instead of a NaN or
//! infinite coordinate so callers never have to inspect the result for
//! poisoned values.

use std::f64::consts::{FRAC_PI_2, PI};

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crs::{CrsKind, Point2D};

/// WGS84 semi-major axis in metres.
pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const FLATTENING: f64 = 1.0 / 298.257_223_563;
/// ITM central-meridian scale factor.
pub const ITM_SCALE_FACTOR: f64 = 1.000_006_7;
/// ITM latitude of origin in degrees.
pub const ITM_ORIGIN_LAT: f64 = 31.734_393_611_111;
/// ITM longitude of origin (central meridian) in degrees.
pub const ITM_ORIGIN_LNG: f64 = 35.204_516_944_444;
/// ITM false easting in metres.
pub const ITM_FALSE_EASTING: f64 = 219_529.584;
/// ITM false northing in metres.
pub const ITM_FALSE_NORTHING: f64 = 626_907.39;
/// Half the circumference of the Web Mercator sphere in metres.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = 20_037_508.34;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Construct a position from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Express the position as a `geo` coordinate (`x = lng`, `y = lat`).
    #[must_use]
    pub const fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    /// Return `true` when both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Errors raised by the closed-form transforms.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
    /// The input or the computed output contained NaN or infinity.
    #[error("{crs} transform of ({x}, {y}) produced a non-finite result")]
    NonFinite {
        /// Coordinate system the transform was interpreting.
        crs: CrsKind,
        /// First input component.
        x: f64,
        /// Second input component.
        y: f64,
    },
}

/// Derived ellipsoid quantities shared by the forward and inverse series.
#[derive(Clone, Copy)]
struct Ellipsoid {
    /// First eccentricity squared.
    e2: f64,
    /// Second eccentricity squared.
    ep2: f64,
}

impl Ellipsoid {
    fn wgs84() -> Self {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        Self {
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Leading coefficient of the meridional arc series.
    fn arc_scale(&self) -> f64 {
        let e4 = self.e2 * self.e2;
        let e6 = e4 * self.e2;
        1.0 - self.e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0
    }

    /// Meridional arc length from the equator to `phi` (radians).
    fn meridional_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        SEMI_MAJOR_AXIS
            * (self.arc_scale() * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Radius of curvature in the prime vertical at `phi` (radians).
    fn prime_vertical_radius(&self, phi: f64) -> f64 {
        SEMI_MAJOR_AXIS / (1.0 - self.e2 * phi.sin().powi(2)).sqrt()
    }
}

fn guard(crs: CrsKind, x: f64, y: f64, result: LatLng) -> Result<LatLng, TransformError> {
    if x.is_finite() && y.is_finite() && result.is_finite() {
        Ok(result)
    } else {
        Err(TransformError::NonFinite { crs, x, y })
    }
}

/// Convert an ITM easting/northing pair to WGS84 degrees.
///
/// # Examples
///
/// ```
/// use landcheck_core::geodesy::{itm_to_wgs84, ITM_FALSE_EASTING, ITM_FALSE_NORTHING};
///
/// let origin = itm_to_wgs84(ITM_FALSE_EASTING, ITM_FALSE_NORTHING)?;
/// assert!((origin.lat - 31.734_393_611_111).abs() < 1e-7);
/// assert!((origin.lng - 35.204_516_944_444).abs() < 1e-7);
/// # Ok::<(), landcheck_core::geodesy::TransformError>(())
/// ```
pub fn itm_to_wgs84(easting: f64, northing: f64) -> Result<LatLng, TransformError> {
    let ellipsoid = Ellipsoid::wgs84();
    let Ellipsoid { e2, ep2 } = ellipsoid;
    let lat0 = ITM_ORIGIN_LAT.to_radians();
    let lng0 = ITM_ORIGIN_LNG.to_radians();

    let arc = ellipsoid.meridional_arc(lat0) + (northing - ITM_FALSE_NORTHING) / ITM_SCALE_FACTOR;
    let mu = arc / (SEMI_MAJOR_AXIS * ellipsoid.arc_scale());

    let root = (1.0 - e2).sqrt();
    let e1 = (1.0 - root) / (1.0 + root);
    let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
    let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
    let j3 = 151.0 * e1.powi(3) / 96.0;
    let j4 = 1097.0 * e1.powi(4) / 512.0;
    let footprint = mu
        + j1 * (2.0 * mu).sin()
        + j2 * (4.0 * mu).sin()
        + j3 * (6.0 * mu).sin()
        + j4 * (8.0 * mu).sin();

    let sin_fp = footprint.sin();
    let cos_fp = footprint.cos();
    let tan_fp = footprint.tan();
    let c1 = ep2 * cos_fp.powi(2);
    let t1 = tan_fp.powi(2);
    let n1 = ellipsoid.prime_vertical_radius(footprint);
    let r1 = SEMI_MAJOR_AXIS * (1.0 - e2) / (1.0 - e2 * sin_fp.powi(2)).powf(1.5);
    let d = (easting - ITM_FALSE_EASTING) / (n1 * ITM_SCALE_FACTOR);

    let lat = footprint
        - (n1 * tan_fp / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);
    let lng = lng0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_fp;

    guard(
        CrsKind::Itm,
        easting,
        northing,
        LatLng::new(lat.to_degrees(), lng.to_degrees()),
    )
}

/// Project WGS84 degrees onto the ITM grid.
///
/// Used to express point-radius queries in the grid the upstream tables are
/// indexed by. The returned coordinate carries `x = easting`, `y = northing`.
pub fn wgs84_to_itm(lat: f64, lng: f64) -> Result<Point2D, TransformError> {
    let ellipsoid = Ellipsoid::wgs84();
    let Ellipsoid { ep2, .. } = ellipsoid;
    let phi = lat.to_radians();
    let lambda = lng.to_radians();
    let lng0 = ITM_ORIGIN_LNG.to_radians();

    let n = ellipsoid.prime_vertical_radius(phi);
    let t = phi.tan().powi(2);
    let c = ep2 * phi.cos().powi(2);
    let a = (lambda - lng0) * phi.cos();
    let arc = ellipsoid.meridional_arc(phi);
    let arc0 = ellipsoid.meridional_arc(ITM_ORIGIN_LAT.to_radians());

    let easting = ITM_FALSE_EASTING
        + ITM_SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
    let northing = ITM_FALSE_NORTHING
        + ITM_SCALE_FACTOR
            * (arc - arc0
                + n * phi.tan()
                    * (a.powi(2) / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

    if lat.is_finite() && lng.is_finite() && easting.is_finite() && northing.is_finite() {
        Ok(Coord {
            x: easting,
            y: northing,
        })
    } else {
        Err(TransformError::NonFinite {
            crs: CrsKind::Wgs84,
            x: lng,
            y: lat,
        })
    }
}

/// Convert Web Mercator metres to WGS84 degrees.
///
/// # Examples
///
/// ```
/// use landcheck_core::geodesy::web_mercator_to_wgs84;
///
/// let origin = web_mercator_to_wgs84(0.0, 0.0)?;
/// assert_eq!(origin.lat, 0.0);
/// assert_eq!(origin.lng, 0.0);
/// # Ok::<(), landcheck_core::geodesy::TransformError>(())
/// ```
pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Result<LatLng, TransformError> {
    let lng = x / WEB_MERCATOR_HALF_EXTENT * 180.0;
    let scaled = y / WEB_MERCATOR_HALF_EXTENT * 180.0;
    let lat = 180.0 / PI * (2.0 * (scaled * PI / 180.0).exp().atan() - FRAC_PI_2);
    guard(CrsKind::WebMercator, x, y, LatLng::new(lat, lng))
}

/// Project WGS84 degrees onto Web Mercator metres.
pub fn wgs84_to_web_mercator(lat: f64, lng: f64) -> Result<Point2D, TransformError> {
    let x = lng * WEB_MERCATOR_HALF_EXTENT / 180.0;
    let y = (((90.0 + lat) * PI / 360.0).tan()).ln() / (PI / 180.0) * WEB_MERCATOR_HALF_EXTENT
        / 180.0;
    if x.is_finite() && y.is_finite() {
        Ok(Coord { x, y })
    } else {
        Err(TransformError::NonFinite {
            crs: CrsKind::Wgs84,
            x: lng,
            y: lat,
        })
    }
}
