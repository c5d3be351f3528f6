//! Ingestion of government GIS layers for the landcheck map.
//!
//! Responsibilities:
//! - Fetch layer pages from the backend proxy behind the [`PageSource`]
//!   trait.
//! - Sort raw rows into geometry envelopes and normalize them to WGS84.
//! - Accumulate each layer incrementally with cancellation by generation.
//!
//! Boundaries:
//! - Coordinate rules live in `landcheck-core`; this crate only applies them.
//! - No rendering, persistence or retries.
//!
//! Invariants:
//! - A bad row is counted, never fatal to its page or load.
//! - Published features only ever grow, in arrival order, within a
//!   generation.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod envelope;
pub mod ingest;
pub mod normalize;
pub mod source;

pub use envelope::{RawGeometryEnvelope, RawRecord, is_wkt_like, merge_properties};
pub use ingest::{
    ChunkedFeatureLoader, DEFAULT_PAGE_SIZE, Generation, LayerAccumulator, LayerSnapshot,
    LoadState, LoadSummary, LoaderConfig, LoaderConfigError, PageOutcome, PageRequest,
    StaleGeneration,
};
pub use normalize::{
    GeometryNormalizer, NormalizeError, RejectionReason, RejectionStats, WKT_WITHOUT_CENTROID,
};
pub use source::{
    HttpPageSource, HttpPageSourceConfig, HttpSourceBuildError, Page, PageFetchError, PageSource,
    RadiusFilter, RadiusFilterError,
};
