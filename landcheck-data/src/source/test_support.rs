//! Test utilities for page sources.
//!
//! [`StubPageSource`] serves scripted pages without a network, and the row
//! builders produce upstream-shaped JSON in each coordinate system.

use std::cell::RefCell;
use std::future::Future;

use async_trait::async_trait;
use serde_json::{Value, json};

use landcheck_core::LatLng;
use landcheck_core::test_support::{itm, web_mercator};

use super::{Page, PageFetchError, PageSource};

/// Stub [`PageSource`] returning pre-configured pages.
///
/// Page `n` is the `n`-th scripted response; pages past the script are empty
/// with `has_more = false`. Every request is recorded.
///
/// # Example
///
/// ```
/// use landcheck_data::source::PageSource;
/// use landcheck_data::source::test_support::{StubPageSource, block_on};
///
/// let source = StubPageSource::new().with_page(Vec::new(), false);
/// let page = block_on(source.fetch_page(1, 10)).expect("scripted page");
/// assert!(!page.has_more);
/// assert_eq!(source.requests(), vec![(1, 10)]);
/// ```
#[derive(Debug, Default)]
pub struct StubPageSource {
    responses: Vec<Result<Page, PageFetchError>>,
    requests: RefCell<Vec<(u32, u32)>>,
}

impl StubPageSource {
    /// Create a source with no scripted pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a successful page.
    #[must_use]
    pub fn with_page(mut self, items: Vec<Value>, has_more: bool) -> Self {
        self.responses.push(Ok(Page::new(items, has_more)));
        self
    }

    /// Append a failed page.
    #[must_use]
    pub fn with_failure(mut self, error: PageFetchError) -> Self {
        self.responses.push(Err(error));
        self
    }

    /// `(page, page_size)` of every request served, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl PageSource for StubPageSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, PageFetchError> {
        self.requests.borrow_mut().push((page, page_size));
        let index = usize::try_from(page.saturating_sub(1)).expect("page index fits in usize");
        self.responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| Ok(Page::default()))
    }
}

/// A network error as the HTTP source would report it.
#[must_use]
pub fn network_error() -> PageFetchError {
    PageFetchError::Network {
        url: "http://stub.invalid/gis".to_owned(),
        message: "connection reset".to_owned(),
    }
}

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be built.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("current-thread runtime should build")
        .block_on(future)
}

/// A GeoJSON point row in WGS84.
#[must_use]
pub fn wgs84_row(id: &str, position: LatLng) -> Value {
    json!({
        "id": id,
        "name": format!("row {id}"),
        "geometry": {"type": "Point", "coordinates": [position.lng, position.lat]},
    })
}

/// A row carrying only an ITM centroid.
#[must_use]
pub fn itm_row(id: &str, position: LatLng) -> Value {
    let grid = itm(position);
    json!({
        "id": id,
        "attributes": {"name": format!("row {id}")},
        "centroid": [grid.x, grid.y],
    })
}

/// A row whose geometry is a Web Mercator GeoJSON point.
#[must_use]
pub fn web_mercator_row(id: &str, position: LatLng) -> Value {
    let metres = web_mercator(position);
    json!({
        "id": id,
        "geometry": {"type": "Point", "coordinates": [metres.x, metres.y]},
    })
}

/// A row whose geometry cannot be read.
#[must_use]
pub fn malformed_row(id: &str) -> Value {
    json!({"id": id, "geometry": "not a geometry"})
}
