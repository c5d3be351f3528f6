//! Body of a proxy page response.

use serde::Deserialize;
use serde_json::Value;

use super::Page;

/// `{"features": [...], "hasMore": bool}`; `items` is accepted for
/// `features` and `has_more` for `hasMore`. Both fields are required.
#[derive(Debug, Deserialize)]
pub(super) struct PageResponse {
    #[serde(alias = "items")]
    features: Option<Vec<Value>>,
    #[serde(rename = "hasMore", alias = "has_more")]
    has_more: Option<bool>,
}

impl PageResponse {
    /// Convert into a [`Page`], refusing bodies without a row array or a
    /// continuation flag.
    pub(super) fn into_page(self) -> Result<Page, &'static str> {
        let items = self.features.ok_or("response has no features array")?;
        let has_more = self.has_more.ok_or("response has no hasMore flag")?;
        Ok(Page::new(items, has_more))
    }
}
