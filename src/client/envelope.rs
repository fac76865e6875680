//! Page envelope parsing
//!
//! Every list endpoint wraps its batch in `{meta: {...}, items: [...]}`,
//! with each item nested one level deeper under the endpoint's singular
//! resource key. Meta counters arrive as numbers or numeric strings
//! depending on endpoint, so parsing is lenient.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, JsonValueExt};

/// One parsed page of an API response
#[derive(Debug, Clone, Default)]
pub struct PageEnvelope {
    /// Total record count across all pages; absence marks the response as
    /// carrying no data
    pub items_total: Option<i64>,
    /// Number of pages in the full result set
    pub items_page_total: Option<i64>,
    /// Records in this page
    pub items_page_size: Option<i64>,
    /// Wrapped records, in arrival order
    pub items: Vec<JsonValue>,
}

impl PageEnvelope {
    /// Parse an envelope out of a response body
    ///
    /// Never fails: anything missing simply stays `None`/empty, and the
    /// caller decides whether that is the soft no-data signal or a
    /// malformed response.
    pub fn from_value(data: &JsonValue) -> Self {
        let meta = data.get("meta");
        let read = |name: &str| {
            meta.and_then(|m| m.get(name))
                .and_then(JsonValueExt::as_i64_lenient)
        };

        let items = data
            .get("items")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();

        Self {
            items_total: read("items_total"),
            items_page_total: read("items_page_total"),
            items_page_size: read("items_page_size"),
            items,
        }
    }
}

/// Unwrap each item from its single-key envelope
///
/// The wrapping key is the endpoint's resource name (`v2/appointment`
/// wraps each record as `{"appointment": {...}}`). An item without the
/// key is a malformed response, not a soft no-data outcome.
pub fn unwrap_items(items: Vec<JsonValue>, resource_key: &str) -> Result<Vec<JsonObject>> {
    items
        .into_iter()
        .map(|item| {
            item.get(resource_key)
                .and_then(JsonValue::as_object)
                .cloned()
                .ok_or_else(|| {
                    Error::malformed(format!("item is not wrapped under '{resource_key}'"))
                })
        })
        .collect()
}
