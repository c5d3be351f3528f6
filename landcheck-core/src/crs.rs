//! Decide which coordinate system produced an unlabeled numeric pair.
//!
//! Upstream tables mix WGS84 degrees, ITM metres and Web Mercator metres
//! without tagging them, and some store northing before easting. The
//! classifier applies an ordered magnitude heuristic and bounds-checks every
//! candidate; nothing is trusted without landing inside the active
//! [`BoundsProfile`].
//!
//! Attempts by magnitude, in order:
//!
//! - both components within `1 000`: WGS84 read as `x = lng`, then swapped;
//! - either component above `1 000 000`: Web Mercator;
//! - anything else: ITM read as `(x, y)`, then as `(y, x)`.

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::BoundsProfile;
use crate::geodesy::{LatLng, TransformError, itm_to_wgs84, web_mercator_to_wgs84};

/// An ambiguous raw pair whose unit and axis order are unknown.
pub type Point2D = Coord<f64>;

/// Largest absolute component still treated as decimal degrees.
pub const DEGREE_MAGNITUDE_LIMIT: f64 = 1_000.0;
/// Components above this magnitude are treated as Web Mercator metres.
pub const WEB_MERCATOR_MAGNITUDE_FLOOR: f64 = 1_000_000.0;

/// Coordinate systems observed in the upstream datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsKind {
    /// Geographic WGS84 degrees.
    Wgs84,
    /// Israeli Transverse Mercator (EPSG:2039) metres.
    Itm,
    /// Spherical Web Mercator (EPSG:3857) metres.
    WebMercator,
}

impl CrsKind {
    /// Convert `point` to WGS84, reading the pair in reverse when `swapped`.
    ///
    /// For WGS84 the unswapped reading is `x = lng, y = lat`; for the planar
    /// systems it is `x = easting, y = northing`.
    pub fn to_wgs84(self, point: Point2D, swapped: bool) -> Result<LatLng, TransformError> {
        let (first, second) = if swapped {
            (point.y, point.x)
        } else {
            (point.x, point.y)
        };
        match self {
            Self::Wgs84 => {
                let result = LatLng::new(second, first);
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(TransformError::NonFinite {
                        crs: self,
                        x: point.x,
                        y: point.y,
                    })
                }
            }
            Self::Itm => itm_to_wgs84(first, second),
            Self::WebMercator => web_mercator_to_wgs84(first, second),
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wgs84 => "wgs84",
            Self::Itm => "itm",
            Self::WebMercator => "web_mercator",
        }
    }
}

impl fmt::Display for CrsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw pair resolved to a WGS84 position inside the active bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Coordinate system the raw pair was interpreted in.
    pub source_crs: CrsKind,
    /// Whether the raw pair had to be read in reverse order.
    pub swapped: bool,
}

impl ClassifiedPoint {
    /// The classified position.
    #[must_use]
    pub const fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// The classified position as a `geo` coordinate (`x = lng`, `y = lat`).
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        self.lat_lng().to_coord()
    }

    /// Apply this classification (same system, same axis order) to another
    /// raw pair from the same source geometry.
    ///
    /// Returns `None` when the result is non-finite or outside `profile`.
    #[must_use]
    pub fn reproject(&self, point: Point2D, profile: &BoundsProfile) -> Option<LatLng> {
        self.source_crs
            .to_wgs84(point, self.swapped)
            .ok()
            .filter(|candidate| profile.contains(candidate.lat, candidate.lng))
    }
}

/// One interpretation tried while classifying a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attempt {
    /// Coordinate system assumed.
    pub crs: CrsKind,
    /// Whether the pair was read in reverse order.
    pub swapped: bool,
    /// Resulting position, or `None` if the transform was non-finite.
    pub candidate: Option<LatLng>,
}

/// No interpretation of a pair landed inside the active bounds.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "no coordinate system placed ({}, {}) inside the {profile} bounds after {} attempts",
    .input.x,
    .input.y,
    .attempts.len()
)]
pub struct ClassificationRejected {
    /// The raw pair that was classified.
    pub input: Point2D,
    /// Name of the bounds profile in force.
    pub profile: &'static str,
    /// Every interpretation tried, in order.
    pub attempts: Vec<Attempt>,
}

const DEGREE_PLAN: [(CrsKind, bool); 2] = [(CrsKind::Wgs84, false), (CrsKind::Wgs84, true)];
const WEB_MERCATOR_PLAN: [(CrsKind, bool); 1] = [(CrsKind::WebMercator, false)];
const ITM_PLAN: [(CrsKind, bool); 2] = [(CrsKind::Itm, false), (CrsKind::Itm, true)];

/// Ordered interpretations to try for `point`, chosen by magnitude.
fn plan(point: Point2D) -> &'static [(CrsKind, bool)] {
    let (x, y) = (point.x.abs(), point.y.abs());
    if x <= DEGREE_MAGNITUDE_LIMIT && y <= DEGREE_MAGNITUDE_LIMIT {
        &DEGREE_PLAN
    } else if x > WEB_MERCATOR_MAGNITUDE_FLOOR || y > WEB_MERCATOR_MAGNITUDE_FLOOR {
        &WEB_MERCATOR_PLAN
    } else {
        &ITM_PLAN
    }
}

/// Classify a raw pair and return its validated WGS84 position.
///
/// The first interpretation landing inside `profile` wins. When none does,
/// the error lists every attempt so rejected rows can be diagnosed.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use landcheck_core::{BoundsProfile, CrsKind, classify};
///
/// let point = classify(Coord { x: 34.7668, y: 32.0749 }, &BoundsProfile::STRICT)?;
/// assert_eq!(point.source_crs, CrsKind::Wgs84);
/// assert!(!point.swapped);
///
/// let rejected = classify(Coord { x: 999_999_999.0, y: -5.0 }, &BoundsProfile::LENIENT);
/// assert!(rejected.is_err());
/// # Ok::<(), landcheck_core::ClassificationRejected>(())
/// ```
pub fn classify(
    point: Point2D,
    profile: &BoundsProfile,
) -> Result<ClassifiedPoint, ClassificationRejected> {
    let mut attempts = Vec::new();
    for &(crs, swapped) in plan(point) {
        let candidate = crs.to_wgs84(point, swapped).ok();
        attempts.push(Attempt {
            crs,
            swapped,
            candidate,
        });
        if let Some(position) = candidate
            && profile.contains(position.lat, position.lng)
        {
            return Ok(ClassifiedPoint {
                lat: position.lat,
                lng: position.lng,
                source_crs: crs,
                swapped,
            });
        }
    }
    Err(ClassificationRejected {
        input: point,
        profile: profile.name(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{wgs84_to_itm, wgs84_to_web_mercator};
    use rstest::{fixture, rstest};

    const TEL_AVIV: LatLng = LatLng::new(32.0749, 34.7668);

    #[fixture]
    fn tel_aviv_itm() -> Point2D {
        wgs84_to_itm(TEL_AVIV.lat, TEL_AVIV.lng).expect("finite projection")
    }

    fn assert_near(actual: LatLng, expected: LatLng, tolerance: f64) {
        assert!(
            (actual.lat - expected.lat).abs() <= tolerance
                && (actual.lng - expected.lng).abs() <= tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[rstest]
    #[case(BoundsProfile::STRICT)]
    #[case(BoundsProfile::LENIENT)]
    fn degrees_are_accepted_unchanged(#[case] profile: BoundsProfile) {
        let point = classify(TEL_AVIV.to_coord(), &profile).expect("in bounds");
        assert_eq!(point.source_crs, CrsKind::Wgs84);
        assert!(!point.swapped);
        assert_eq!(point.lat_lng(), TEL_AVIV);
    }

    #[rstest]
    fn reversed_degrees_are_swapped() {
        let reversed = Coord {
            x: TEL_AVIV.lat,
            y: TEL_AVIV.lng,
        };
        let point = classify(reversed, &BoundsProfile::STRICT).expect("swap retry");
        assert_eq!(point.source_crs, CrsKind::Wgs84);
        assert!(point.swapped);
        assert_eq!(point.lat_lng(), TEL_AVIV);
    }

    #[rstest]
    fn itm_pairs_are_inverted(tel_aviv_itm: Point2D) {
        let point = classify(tel_aviv_itm, &BoundsProfile::STRICT).expect("in bounds");
        assert_eq!(point.source_crs, CrsKind::Itm);
        assert!(!point.swapped);
        assert_near(point.lat_lng(), TEL_AVIV, 1e-4);
    }

    #[rstest]
    fn northing_first_itm_pairs_use_the_swap_retry(tel_aviv_itm: Point2D) {
        let reversed = Coord {
            x: tel_aviv_itm.y,
            y: tel_aviv_itm.x,
        };
        let point = classify(reversed, &BoundsProfile::STRICT).expect("swap retry");
        assert_eq!(point.source_crs, CrsKind::Itm);
        assert!(point.swapped);
        assert_near(point.lat_lng(), TEL_AVIV, 1e-4);
    }

    #[rstest]
    fn large_magnitudes_are_web_mercator() {
        let metres = wgs84_to_web_mercator(TEL_AVIV.lat, TEL_AVIV.lng).expect("finite");
        let point = classify(metres, &BoundsProfile::LENIENT).expect("in bounds");
        assert_eq!(point.source_crs, CrsKind::WebMercator);
        assert_near(point.lat_lng(), TEL_AVIV, 1e-9);
    }

    #[rstest]
    #[case(BoundsProfile::STRICT)]
    #[case(BoundsProfile::LENIENT)]
    fn implausible_pairs_are_rejected(#[case] profile: BoundsProfile) {
        let err = classify(
            Coord {
                x: 999_999_999.0,
                y: -5.0,
            },
            &profile,
        )
        .expect_err("nothing lands in bounds");
        assert_eq!(err.profile, profile.name());
        assert_eq!(err.attempts.len(), 1);
        assert_eq!(err.attempts[0].crs, CrsKind::WebMercator);
    }

    #[rstest]
    fn rejection_lists_both_itm_attempts() {
        let err = classify(Coord { x: 5_000.0, y: 5_000.0 }, &BoundsProfile::STRICT)
            .expect_err("far outside the grid");
        let tried: Vec<_> = err.attempts.iter().map(|a| (a.crs, a.swapped)).collect();
        assert_eq!(tried, vec![(CrsKind::Itm, false), (CrsKind::Itm, true)]);
    }

    #[rstest]
    fn non_finite_pairs_are_rejected_not_propagated() {
        let err = classify(
            Coord {
                x: f64::NAN,
                y: 32.0,
            },
            &BoundsProfile::LENIENT,
        )
        .expect_err("NaN never classifies");
        assert!(err.attempts.iter().all(|attempt| attempt.candidate.is_none()));
    }

    #[rstest]
    fn reproject_reuses_the_winning_interpretation(tel_aviv_itm: Point2D) {
        let point = classify(tel_aviv_itm, &BoundsProfile::STRICT).expect("in bounds");
        let nearby = Coord {
            x: tel_aviv_itm.x + 100.0,
            y: tel_aviv_itm.y + 100.0,
        };
        let moved = point
            .reproject(nearby, &BoundsProfile::STRICT)
            .expect("nearby point stays in bounds");
        assert!(moved.lat > point.lat);
        assert!(moved.lng > point.lng);
    }
}
