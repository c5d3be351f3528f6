//! Per-layer feature accumulator guarded by generation tokens.
//!
//! A layer's features grow page by page while it is loading. Showing or
//! hiding the layer starts a new generation; anything still carrying an older
//! generation is refused, so a late page can never land in a cleared layer.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use landcheck_core::{LayerKind, NormalizedFeature, feature_collection};

use crate::normalize::RejectionStats;
use crate::source::PageFetchError;

/// Identifies one show/hide cycle of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The generation after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A mutation carried a generation that is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stale generation {stale} (current {current})")]
pub struct StaleGeneration {
    /// Generation the caller supplied.
    pub stale: Generation,
    /// Generation in force.
    pub current: Generation,
}

/// Accumulated features of one layer.
#[derive(Debug)]
pub struct LayerAccumulator {
    layer: LayerKind,
    features: Vec<NormalizedFeature>,
    loading: bool,
    finished: bool,
    error: Option<PageFetchError>,
    generation: Generation,
    rejected: RejectionStats,
}

impl LayerAccumulator {
    /// An empty, idle accumulator.
    #[must_use]
    pub fn new(layer: LayerKind) -> Self {
        Self {
            layer,
            features: Vec::new(),
            loading: false,
            finished: false,
            error: None,
            generation: Generation::default(),
            rejected: RejectionStats::default(),
        }
    }

    /// The current generation.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Start a fresh load: clear everything, mark loading, and return the new
    /// generation.
    pub fn begin(&mut self) -> Generation {
        self.reset();
        self.loading = true;
        self.generation
    }

    /// Drop all state and invalidate outstanding work.
    pub fn clear(&mut self) -> Generation {
        self.reset();
        self.generation
    }

    fn reset(&mut self) {
        self.features.clear();
        self.loading = false;
        self.finished = false;
        self.error = None;
        self.rejected = RejectionStats::default();
        self.generation = self.generation.next();
    }

    fn check(&self, generation: Generation) -> Result<(), StaleGeneration> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(StaleGeneration {
                stale: generation,
                current: self.generation,
            })
        }
    }

    /// Append features in arrival order and add page rejections.
    ///
    /// Returns the total feature count afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`StaleGeneration`] and leaves the accumulator untouched when
    /// `generation` is not current.
    pub fn append(
        &mut self,
        generation: Generation,
        features: Vec<NormalizedFeature>,
        rejected: &RejectionStats,
    ) -> Result<usize, StaleGeneration> {
        self.check(generation)?;
        self.features.extend(features);
        self.rejected.merge(rejected);
        Ok(self.features.len())
    }

    /// Mark the load complete.
    ///
    /// # Errors
    ///
    /// Returns [`StaleGeneration`] when `generation` is not current.
    pub fn finish(&mut self, generation: Generation) -> Result<(), StaleGeneration> {
        self.check(generation)?;
        self.loading = false;
        self.finished = true;
        Ok(())
    }

    /// Mark the load failed, keeping the features gathered so far.
    ///
    /// # Errors
    ///
    /// Returns [`StaleGeneration`] when `generation` is not current.
    pub fn fail(
        &mut self,
        generation: Generation,
        error: PageFetchError,
    ) -> Result<(), StaleGeneration> {
        self.check(generation)?;
        self.loading = false;
        self.error = Some(error);
        Ok(())
    }

    /// A read-only view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> LayerSnapshot<'_> {
        LayerSnapshot {
            layer: self.layer,
            features: &self.features,
            loading: self.loading,
            finished: self.finished,
            error: self.error.as_ref(),
            generation: self.generation,
            rejected: self.rejected,
        }
    }
}

/// Borrowed view of a [`LayerAccumulator`].
#[derive(Debug, Clone, Copy)]
pub struct LayerSnapshot<'a> {
    /// Layer the features belong to.
    pub layer: LayerKind,
    /// Features in arrival order.
    pub features: &'a [NormalizedFeature],
    /// Whether more pages are expected.
    pub loading: bool,
    /// Whether the current generation ran to its last page.
    pub finished: bool,
    /// Fetch failure that ended the load.
    pub error: Option<&'a PageFetchError>,
    /// Generation the view was taken at.
    pub generation: Generation,
    /// Rows rejected so far.
    pub rejected: RejectionStats,
}

impl LayerSnapshot<'_> {
    /// Whether the load reached its last page without a failure.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the layer is neither loading nor holding a finished or
    /// failed load, as before the first show or after a hide.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.loading && !self.finished && self.error.is_none()
    }

    /// Render the features as a GeoJSON `FeatureCollection`.
    #[must_use]
    pub fn to_feature_collection(&self) -> Value {
        feature_collection(self.features)
    }
}
