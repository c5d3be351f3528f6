//! Paginated access to the GIS backend proxy.
//!
//! [`PageSource`] is the seam between the loader and the network. The HTTP
//! implementation talks to the proxy; [`test_support::StubPageSource`] serves
//! scripted pages in tests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use landcheck_core::{LatLng, LayerKind};
//! use landcheck_data::source::{HttpPageSource, HttpPageSourceConfig, PageSource, RadiusFilter};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpPageSourceConfig::new("http://localhost:8080/api")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_radius(RadiusFilter::new(LatLng::new(32.0749, 34.7668), 750.0));
//! let source = HttpPageSource::new(&config, LayerKind::Parcels)?;
//! let page = source.fetch_page(1, 500).await?;
//! println!("{} rows, more: {}", page.items.len(), page.has_more);
//! # Ok(())
//! # }
//! ```

mod http;
mod query;
mod response;

#[doc(hidden)]
pub mod test_support;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::{DEFAULT_USER_AGENT, HttpPageSource, HttpPageSourceConfig, HttpSourceBuildError};
pub use query::{RadiusFilter, RadiusFilterError};

/// One page of raw rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw rows in upstream order.
    pub items: Vec<Value>,
    /// Whether the upstream reports further pages.
    pub has_more: bool,
}

impl Page {
    /// Build a page from rows.
    #[must_use]
    pub fn new(items: Vec<Value>, has_more: bool) -> Self {
        Self { items, has_more }
    }
}

/// A page fetch that did not produce a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PageFetchError {
    /// The proxy answered with an error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request never completed.
    #[error("network error requesting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The response body was not a page.
    #[error("malformed page from {url}: {message}")]
    Parse {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
}

/// Serves pages of one layer.
///
/// `page` starts at 1 and `page_size` is positive.
#[async_trait(?Send)]
pub trait PageSource {
    /// Fetch one page.
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, PageFetchError>;
}

#[async_trait(?Send)]
impl<S: PageSource + ?Sized> PageSource for &S {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, PageFetchError> {
        (**self).fetch_page(page, page_size).await
    }
}
