//! Coordinate-system domain types for the landcheck map.
//!
//! Upstream GIS tables deliver unlabeled coordinate pairs in WGS84 degrees,
//! Israeli Transverse Mercator metres or Web Mercator metres, sometimes with
//! the axes reversed. This crate holds the pure pieces: the geodesy
//! transforms, the region bounds, the classifier deciding which system a pair
//! came from, and the feature model emitted once geometry is normalized.
//!
//! Invariants:
//! - Every position handed out is finite and inside the caller's
//!   [`BoundsProfile`].
//! - No I/O; everything here is deterministic.

#![forbid(unsafe_code)]

pub mod bounds;
pub mod crs;
pub mod feature;
pub mod geodesy;
pub mod layer;

#[doc(hidden)]
pub mod test_support;

pub use bounds::{BoundsProfile, BoundsProfileParseError, in_region};
pub use crs::{
    Attempt, ClassificationRejected, ClassifiedPoint, CrsKind, DEGREE_MAGNITUDE_LIMIT, Point2D,
    WEB_MERCATOR_MAGNITUDE_FLOOR, classify,
};
pub use feature::{FeatureGeometry, NormalizedFeature, Properties, Provenance, feature_collection};
pub use geodesy::{
    LatLng, TransformError, itm_to_wgs84, web_mercator_to_wgs84, wgs84_to_itm,
    wgs84_to_web_mercator,
};
pub use layer::{LayerKind, LayerParseError};
