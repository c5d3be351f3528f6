//! HTTP `PageSource` backed by the GIS proxy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use landcheck_core::LayerKind;

use super::query::{ITM_SRID, RadiusFilter, RadiusFilterError};
use super::response::PageResponse;
use super::{Page, PageFetchError, PageSource};

/// Default user agent for proxy requests.
pub const DEFAULT_USER_AGENT: &str = "landcheck-loader/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for [`HttpPageSource`] construction failures.
#[derive(Debug, Error)]
pub enum HttpSourceBuildError {
    /// The base URL and layer endpoint do not form a valid URL.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The radius filter cannot be turned into a query envelope.
    #[error(transparent)]
    Radius(#[from] RadiusFilterError),
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration for [`HttpPageSource`].
#[derive(Debug, Clone)]
pub struct HttpPageSourceConfig {
    /// Base URL of the proxy (e.g., `"http://localhost:8080/api"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Optional point-radius restriction.
    pub radius: Option<RadiusFilter>,
}

impl Default for HttpPageSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            radius: None,
        }
    }
}

impl HttpPageSourceConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Restrict every page to rows near a position.
    #[must_use]
    pub fn with_radius(mut self, radius: RadiusFilter) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Fetches one layer's pages from the proxy.
///
/// Requests go to `{base_url}/{layer endpoint}?page=N&pageSize=M`, plus
/// `bbox=xmin,ymin,xmax,ymax&bboxSR=2039` when a radius filter is set.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    bbox: Option<String>,
}

impl HttpPageSource {
    /// Build a source for `layer` with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the radius centre does not
    /// project, or the HTTP client fails to build.
    pub fn new(
        config: &HttpPageSourceConfig,
        layer: LayerKind,
    ) -> Result<Self, HttpSourceBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        Self::with_client(client, config, layer)
    }

    /// Build a source for `layer` sharing an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the radius centre does not
    /// project.
    pub fn with_client(
        client: Client,
        config: &HttpPageSourceConfig,
        layer: LayerKind,
    ) -> Result<Self, HttpSourceBuildError> {
        let raw = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            layer.endpoint()
        );
        let endpoint = Url::parse(&raw)
            .map_err(|source| HttpSourceBuildError::InvalidBaseUrl { url: raw, source })?;
        let bbox = config
            .radius
            .as_ref()
            .map(RadiusFilter::bbox_param)
            .transpose()?;
        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
            bbox,
        })
    }

    /// The layer endpoint, without query parameters.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn page_url(&self, page: u32, page_size: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("pageSize", &page_size.to_string());
            if let Some(bbox) = &self.bbox {
                query
                    .append_pair("bbox", bbox)
                    .append_pair("bboxSR", &ITM_SRID.to_string());
            }
        }
        url
    }

    /// Convert a reqwest error to a `PageFetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> PageFetchError {
        if error.is_timeout() {
            return PageFetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return PageFetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() {
            return PageFetchError::Parse {
                url: url.to_owned(),
                message: error.to_string(),
            };
        }

        PageFetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait(?Send)]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page, PageFetchError> {
        let url = self.page_url(page, page_size);
        let url_text = url.as_str();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url_text))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url_text))?;

        let body: PageResponse = response
            .json()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url_text))?;

        body.into_page().map_err(|message| PageFetchError::Parse {
            url: url_text.to_owned(),
            message: message.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landcheck_core::LatLng;
    use rstest::rstest;

    fn source(config: &HttpPageSourceConfig) -> HttpPageSource {
        HttpPageSource::new(config, LayerKind::Blocks).expect("source should build")
    }

    #[rstest]
    fn page_url_carries_paging_parameters() {
        let source = source(&HttpPageSourceConfig::new("http://proxy.example.com/api/"));

        let url = source.page_url(3, 500);

        assert_eq!(
            url.as_str(),
            "http://proxy.example.com/api/gis/gushim?page=3&pageSize=500"
        );
    }

    #[rstest]
    fn page_url_appends_radius_envelope() {
        let config = HttpPageSourceConfig::new("http://proxy.example.com")
            .with_radius(RadiusFilter::new(LatLng::new(32.0749, 34.7668), 300.0));
        let source = source(&config);

        let url = source.page_url(1, 50);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[2].0, "bbox");
        assert_eq!(pairs[2].1.split(',').count(), 4);
        assert_eq!(pairs[3], ("bboxSR".to_owned(), "2039".to_owned()));
    }

    #[rstest]
    fn invalid_base_urls_are_rejected() {
        let err = HttpPageSource::new(&HttpPageSourceConfig::new("not a url"), LayerKind::Parcels)
            .expect_err("relative URL");
        assert!(matches!(err, HttpSourceBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn unprojectable_radius_centres_are_rejected() {
        let config = HttpPageSourceConfig::new("http://proxy.example.com")
            .with_radius(RadiusFilter::new(LatLng::new(f64::NAN, 34.0), 300.0));
        let err = HttpPageSource::new(&config, LayerKind::Parcels).expect_err("NaN centre");
        assert!(matches!(err, HttpSourceBuildError::Radius(_)));
    }

    #[rstest]
    fn infinite_radii_are_rejected() {
        let config = HttpPageSourceConfig::new("http://proxy.example.com")
            .with_radius(RadiusFilter::new(LatLng::new(32.0749, 34.7668), f64::INFINITY));
        let err = HttpPageSource::new(&config, LayerKind::Parcels).expect_err("infinite radius");
        assert!(matches!(
            err,
            HttpSourceBuildError::Radius(RadiusFilterError::NonFiniteRadius { .. })
        ));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpPageSourceConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert!(config.radius.is_none());
    }

    #[rstest]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(
            HttpPageSourceConfig::default().timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
