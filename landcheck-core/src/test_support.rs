//! Fixture positions and projections shared by unit and behaviour tests.

use crate::{LatLng, Point2D, wgs84_to_itm, wgs84_to_web_mercator};

/// Central Tel Aviv, inside both bounds profiles.
pub const TEL_AVIV: LatLng = LatLng::new(32.0749, 34.7668);

/// Central Jerusalem, inside both bounds profiles.
pub const JERUSALEM: LatLng = LatLng::new(31.7683, 35.2137);

/// Project `position` to ITM metres.
///
/// # Panics
///
/// Panics if the projection is non-finite; fixtures are always finite.
#[must_use]
pub fn itm(position: LatLng) -> Point2D {
    wgs84_to_itm(position.lat, position.lng).expect("fixture position projects to ITM")
}

/// Project `position` to Web Mercator metres.
///
/// # Panics
///
/// Panics if the projection is non-finite; fixtures are always finite.
#[must_use]
pub fn web_mercator(position: LatLng) -> Point2D {
    wgs84_to_web_mercator(position.lat, position.lng)
        .expect("fixture position projects to Web Mercator")
}

/// Return `true` when both components are within `tolerance` degrees.
#[must_use]
pub fn approx_eq(actual: LatLng, expected: LatLng, tolerance: f64) -> bool {
    (actual.lat - expected.lat).abs() <= tolerance && (actual.lng - expected.lng).abs() <= tolerance
}
