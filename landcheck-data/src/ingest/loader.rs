//! Chunked, cancellable loading of one layer.
//!
//! The loader is a small state machine:
//!
//! ```text
//! Idle --show--> Loading{page} --last page--> Exhausted
//!                     |
//!                     +--fetch error--> Failed
//! ```
//!
//! The core is sans-IO: [`ChunkedFeatureLoader::issue_request`] hands out at
//! most one request at a time and [`ChunkedFeatureLoader::apply`] folds its
//! result in. [`ChunkedFeatureLoader::step`] and
//! [`ChunkedFeatureLoader::run`] drive that core against a [`PageSource`].
//! Fetch failures are never retried.

use log::{debug, info, warn};
use thiserror::Error;

use landcheck_core::{BoundsProfile, LayerKind};

use super::accumulator::{Generation, LayerAccumulator, LayerSnapshot};
use crate::normalize::{GeometryNormalizer, RejectionStats};
use crate::source::{Page, PageFetchError, PageSource};

/// Rows requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Errors returned by [`LoaderConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoaderConfigError {
    /// Pages must hold at least one row.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Loader tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderConfig {
    page_size: u32,
    profile: BoundsProfile,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            profile: BoundsProfile::LENIENT,
        }
    }
}

impl LoaderConfig {
    /// Validate and construct a config with the lenient bounds profile.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderConfigError::ZeroPageSize`] when `page_size` is zero.
    pub fn new(page_size: u32) -> Result<Self, LoaderConfigError> {
        if page_size == 0 {
            return Err(LoaderConfigError::ZeroPageSize);
        }
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    /// Validate rows against `profile` instead.
    #[must_use]
    pub const fn with_profile(mut self, profile: BoundsProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Bounds profile applied to every row.
    #[must_use]
    pub const fn profile(&self) -> BoundsProfile {
        self.profile
    }
}

/// Loader lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Hidden; nothing loaded.
    Idle,
    /// Pages remain; `next_page` is the next one to request.
    Loading {
        /// 1-based page number.
        next_page: u32,
    },
    /// The upstream reported no further pages.
    Exhausted,
    /// A fetch failed; features gathered so far are kept.
    Failed,
}

/// A page request handed out by [`ChunkedFeatureLoader::issue_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Generation the request belongs to.
    pub generation: Generation,
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

/// What applying a page result did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The result belonged to a stale or unknown request and was dropped.
    Discarded,
    /// Rows were appended and more pages follow.
    Appended {
        /// Page number.
        page: u32,
        /// Features appended.
        accepted: usize,
        /// Rows rejected.
        rejected: u64,
    },
    /// Rows were appended and this was the last page.
    Exhausted {
        /// Page number.
        page: u32,
        /// Features appended.
        accepted: usize,
        /// Rows rejected.
        rejected: u64,
    },
    /// The fetch failed and the load stopped.
    Failed(PageFetchError),
}

/// Totals for one completed `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Layer loaded.
    pub layer: LayerKind,
    /// Final state.
    pub state: LoadState,
    /// Pages applied.
    pub pages: u32,
    /// Features accumulated.
    pub features: usize,
    /// Rejections by reason.
    pub rejections: RejectionStats,
    /// Features whose raw pair order was reversed.
    pub swapped: u64,
    /// Features reduced to a centroid.
    pub degraded: u64,
    /// Failure that ended the load.
    pub error: Option<PageFetchError>,
}

/// Loads one layer page by page into its own [`LayerAccumulator`].
///
/// # Examples
///
/// ```
/// use landcheck_core::LayerKind;
/// use landcheck_core::test_support::TEL_AVIV;
/// use landcheck_data::ingest::{ChunkedFeatureLoader, LoadState, LoaderConfig};
/// use landcheck_data::source::test_support::{StubPageSource, block_on, wgs84_row};
///
/// let source = StubPageSource::new().with_page(vec![wgs84_row("a", TEL_AVIV)], false);
/// let mut loader = ChunkedFeatureLoader::new(LayerKind::Parcels, source, LoaderConfig::default());
/// let summary = block_on(loader.run(|_| {}));
/// assert_eq!(summary.state, LoadState::Exhausted);
/// assert_eq!(summary.features, 1);
/// ```
#[derive(Debug)]
pub struct ChunkedFeatureLoader<S> {
    layer: LayerKind,
    source: S,
    config: LoaderConfig,
    normalizer: GeometryNormalizer,
    accumulator: LayerAccumulator,
    state: LoadState,
    in_flight: Option<PageRequest>,
    pages: u32,
    swapped: u64,
    degraded: u64,
}

impl<S> ChunkedFeatureLoader<S> {
    /// Create an idle loader.
    #[must_use]
    pub fn new(layer: LayerKind, source: S, config: LoaderConfig) -> Self {
        Self {
            layer,
            source,
            config,
            normalizer: GeometryNormalizer::new(config.profile()),
            accumulator: LayerAccumulator::new(layer),
            state: LoadState::Idle,
            in_flight: None,
            pages: 0,
            swapped: 0,
            degraded: 0,
        }
    }

    /// Layer this loader serves.
    #[must_use]
    pub const fn layer(&self) -> LayerKind {
        self.layer
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LoadState {
        self.state
    }

    /// Read-only view of the accumulated features.
    #[must_use]
    pub fn snapshot(&self) -> LayerSnapshot<'_> {
        self.accumulator.snapshot()
    }

    /// The page source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Reset the layer and start loading from page 1.
    pub fn show(&mut self) -> Generation {
        let generation = self.accumulator.begin();
        self.reset_counters();
        self.state = LoadState::Loading { next_page: 1 };
        debug!("{} shown, generation {generation}", self.layer);
        generation
    }

    /// Stop loading and drop everything gathered so far.
    pub fn hide(&mut self) {
        let generation = self.accumulator.clear();
        self.reset_counters();
        self.state = LoadState::Idle;
        debug!("{} hidden, generation {generation}", self.layer);
    }

    fn reset_counters(&mut self) {
        self.in_flight = None;
        self.pages = 0;
        self.swapped = 0;
        self.degraded = 0;
    }

    /// Hand out the next page request, unless one is in flight or the load
    /// is not running.
    pub fn issue_request(&mut self) -> Option<PageRequest> {
        let LoadState::Loading { next_page } = self.state else {
            return None;
        };
        if self.in_flight.is_some() {
            return None;
        }
        let request = PageRequest {
            generation: self.accumulator.generation(),
            page: next_page,
            page_size: self.config.page_size(),
        };
        self.in_flight = Some(request);
        Some(request)
    }

    /// Fold the result of `request` into the layer.
    pub fn apply(
        &mut self,
        request: PageRequest,
        result: Result<Page, PageFetchError>,
    ) -> PageOutcome {
        if self.in_flight != Some(request) {
            warn!(
                "{}: discarding stale page {} from generation {} (current {})",
                self.layer,
                request.page,
                request.generation,
                self.accumulator.generation()
            );
            return PageOutcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(page) => self.apply_page(request, &page),
            Err(error) => {
                warn!("{}: page {} failed: {error}", self.layer, request.page);
                if self.accumulator.fail(request.generation, error.clone()).is_err() {
                    return PageOutcome::Discarded;
                }
                self.state = LoadState::Failed;
                PageOutcome::Failed(error)
            }
        }
    }

    fn apply_page(&mut self, request: PageRequest, page: &Page) -> PageOutcome {
        let mut stats = RejectionStats::default();
        let prefix = format!("{}-{}", self.layer, request.page);
        let features = self
            .normalizer
            .normalize_page(&page.items, &prefix, &mut stats);
        let accepted = features.len();
        let swapped = features.iter().filter(|f| f.provenance.swapped).count();
        let degraded = features.iter().filter(|f| f.provenance.degraded).count();

        let Ok(total) = self.accumulator.append(request.generation, features, &stats) else {
            return PageOutcome::Discarded;
        };
        self.pages += 1;
        self.swapped += swapped as u64;
        self.degraded += degraded as u64;
        let rejected = stats.total();
        debug!(
            "{}: page {} applied, {accepted} accepted, {rejected} rejected, {total} total",
            self.layer, request.page
        );

        if page.items.is_empty() || !page.has_more {
            if self.accumulator.finish(request.generation).is_err() {
                return PageOutcome::Discarded;
            }
            self.state = LoadState::Exhausted;
            info!(
                "{}: loaded {total} features from {} pages",
                self.layer, self.pages
            );
            return PageOutcome::Exhausted {
                page: request.page,
                accepted,
                rejected,
            };
        }

        self.state = LoadState::Loading {
            next_page: request.page + 1,
        };
        PageOutcome::Appended {
            page: request.page,
            accepted,
            rejected,
        }
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> LoadSummary {
        let snapshot = self.accumulator.snapshot();
        LoadSummary {
            layer: self.layer,
            state: self.state,
            pages: self.pages,
            features: snapshot.features.len(),
            rejections: snapshot.rejected,
            swapped: self.swapped,
            degraded: self.degraded,
            error: snapshot.error.cloned(),
        }
    }
}

impl<S: PageSource> ChunkedFeatureLoader<S> {
    /// Issue, fetch and apply one page. Returns `None` when there is nothing
    /// to request.
    pub async fn step(&mut self) -> Option<PageOutcome> {
        let request = self.issue_request()?;
        let result = self
            .source
            .fetch_page(request.page, request.page_size)
            .await;
        Some(self.apply(request, result))
    }

    /// Load until exhausted or failed, calling `listener` with a snapshot
    /// after every change. An idle loader is shown first.
    pub async fn run<F>(&mut self, mut listener: F) -> LoadSummary
    where
        F: FnMut(&LayerSnapshot<'_>),
    {
        if self.state == LoadState::Idle {
            self.show();
            listener(&self.snapshot());
        }
        while let Some(outcome) = self.step().await {
            if outcome != PageOutcome::Discarded {
                listener(&self.snapshot());
            }
        }
        self.summary()
    }
}
