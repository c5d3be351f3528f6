//! Incremental per-layer loading.
//!
//! Each visible layer owns one [`ChunkedFeatureLoader`], which in turn owns
//! its [`LayerAccumulator`]. Layers share no mutable state, so several
//! loaders can run side by side on one thread.

mod accumulator;
mod loader;

pub use accumulator::{Generation, LayerAccumulator, LayerSnapshot, StaleGeneration};
pub use loader::{
    ChunkedFeatureLoader, DEFAULT_PAGE_SIZE, LoadState, LoadSummary, LoaderConfig,
    LoaderConfigError, PageOutcome, PageRequest,
};
