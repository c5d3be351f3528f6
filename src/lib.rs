//! Facade crate for the landcheck layer loader.
//!
//! This crate re-exports the coordinate classification and feature model
//! types, and exposes the paginated loader behind the `data` feature.

#![forbid(unsafe_code)]

pub use landcheck_core::{
    BoundsProfile, ClassificationRejected, ClassifiedPoint, CrsKind, FeatureGeometry, LatLng,
    LayerKind, NormalizedFeature, Point2D, Provenance, TransformError, classify,
    feature_collection, in_region, itm_to_wgs84, web_mercator_to_wgs84,
};

#[cfg(feature = "data")]
pub use landcheck_data::{
    ChunkedFeatureLoader, GeometryNormalizer, HttpPageSource, HttpPageSourceConfig, LayerSnapshot,
    LoadState, LoadSummary, LoaderConfig, Page, PageFetchError, PageSource, RadiusFilter,
    RadiusFilterError, RejectionStats,
};
