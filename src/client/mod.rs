//! API client
//!
//! `EzyVetClient` is the one entry point for remote reads: it builds query
//! parameters, resolves per-location credentials, walks the paginated
//! envelope in strict page order, and hands back unwrapped records.
//!
//! A response without `meta.items_total`, or with an empty first page, is a
//! soft "no data" outcome (`Ok(None)`), not an error; the raw payload is
//! logged so a schema change upstream is visible.

mod date_filter;
mod envelope;
mod params;

pub use date_filter::build_date_filter;
pub use envelope::PageEnvelope;
pub use params::{build_params, Filter, ParamValue, Params};

use crate::auth::{CredentialRecord, CredentialResolver, OauthTokenIssuer};
use crate::config::{ApiConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Transport};
use crate::store::CredentialStore;
use crate::types::{field_i64, field_string, JsonObject, LocationId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of IDs per batched `in` filter
const ID_CHUNK_SIZE: usize = 100;

/// Client for the remote practice-management API
pub struct EzyVetClient {
    api: ApiConfig,
    transport: Arc<dyn Transport>,
    resolver: Arc<CredentialResolver>,
}

impl EzyVetClient {
    /// Build a client over a credential store using the live HTTP transport
    pub fn new(config: &SyncConfig, store: Arc<dyn CredentialStore>) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api));
        let issuer = Arc::new(OauthTokenIssuer::new(&config.api));
        let resolver = Arc::new(CredentialResolver::new(
            store,
            issuer,
            config.api.token_cache_ttl_minutes,
        ));
        Self::with_parts(config.api.clone(), transport, resolver)
    }

    /// Build a client from explicit parts (dependency injection seam)
    pub fn with_parts(
        api: ApiConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<CredentialResolver>,
    ) -> Self {
        Self {
            api,
            transport,
            resolver,
        }
    }

    /// Fetch every record of an endpoint, flattening all pages
    ///
    /// Returns `Ok(None)` when the response carries no data (missing
    /// `items_total` or an empty first page).
    pub async fn get(
        &self,
        location_id: LocationId,
        endpoint_ver: &str,
        endpoint_name: &str,
        params: Option<Params>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<Option<Vec<JsonObject>>> {
        let endpoint = format!("{endpoint_ver}/{endpoint_name}");
        let query = build_params(params.unwrap_or_default());
        let credentials = self.resolver.resolve(location_id).await?;
        let headers = set_headers(&credentials, headers)?;
        let url = self.api.endpoint_url(&endpoint);

        let data = self.transport.get_json(&url, &query, &headers).await?;
        let envelope = PageEnvelope::from_value(&data);

        let Some(record_count) = envelope.items_total else {
            warn!("items_total not found in response: {data}");
            return Ok(None);
        };
        let pages = envelope
            .items_page_total
            .ok_or_else(|| Error::malformed("missing items_page_total in response meta"))?;
        info!("Returned {record_count} records over {pages} pages.");

        if envelope.items.is_empty() {
            warn!("No results returned");
            return Ok(None);
        }

        let mut wrapped = envelope.items;
        for page_num in 2..=pages {
            let mut page_query = query.clone();
            page_query.push(("page".to_string(), page_num.to_string()));
            let data = self.transport.get_json(&url, &page_query, &headers).await?;
            let envelope = PageEnvelope::from_value(&data);
            if let Some(size) = envelope.items_page_size {
                debug!("Page {page_num} has {size} records.");
            }
            wrapped.extend(envelope.items);
        }

        let records = envelope::unwrap_items(wrapped, endpoint_name)?;
        Ok(Some(records))
    }

    /// Fetch records within a date range on the given filter field
    ///
    /// The built filter overwrites any existing parameter with the same
    /// field name.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_date_range(
        &self,
        location_id: LocationId,
        endpoint_ver: &str,
        endpoint_name: &str,
        date_filter_field: &str,
        params: Option<Params>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        days: Option<i64>,
    ) -> Result<Option<Vec<JsonObject>>> {
        let filter = build_date_filter(start_date, end_date, days)?;
        let mut params = params.unwrap_or_default();
        params.insert(date_filter_field.to_string(), ParamValue::Filter(filter));
        self.get(location_id, endpoint_ver, endpoint_name, Some(params), None)
            .await
    }

    /// Fetch records by ID, batching into `in` filters of at most 100
    ///
    /// Chunk order and within-chunk order are preserved in the output. A
    /// chunk that resolves to no data contributes nothing.
    pub async fn get_by_ids(
        &self,
        location_id: LocationId,
        endpoint_ver: &str,
        endpoint_name: &str,
        ids: &[i64],
        params: Option<Params>,
    ) -> Result<Vec<JsonObject>> {
        let mut params = params.unwrap_or_default();
        let mut output = Vec::with_capacity(ids.len());
        let total = ids.len();

        for (index, chunk) in ids.chunks(ID_CHUNK_SIZE).enumerate() {
            let start = index * ID_CHUNK_SIZE;
            info!(
                "Getting records from {endpoint_ver}/{endpoint_name} IDs: {start}..{} of {total}.",
                start + chunk.len()
            );
            params.insert(
                "id".to_string(),
                ParamValue::Filter(Filter::new().is_in(chunk.iter().copied())),
            );
            if let Some(batch) = self
                .get(
                    location_id,
                    endpoint_ver,
                    endpoint_name,
                    Some(params.clone()),
                    None,
                )
                .await?
            {
                output.extend(batch);
            }
        }

        Ok(output)
    }

    /// Build an id → name translation table from a lookup endpoint
    pub async fn get_translation(
        &self,
        location_id: LocationId,
        endpoint_ver: &str,
        endpoint_name: &str,
    ) -> Result<HashMap<i64, String>> {
        let records = self
            .get(location_id, endpoint_ver, endpoint_name, None, None)
            .await?
            .unwrap_or_default();

        let mut translation = HashMap::with_capacity(records.len());
        for record in &records {
            let id = field_i64(record, "id").ok_or_else(|| {
                Error::malformed(format!("{endpoint_name} record has no usable 'id'"))
            })?;
            let name = field_string(record, "name").unwrap_or_default();
            translation.insert(id, name);
        }
        Ok(translation)
    }
}

impl std::fmt::Debug for EzyVetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EzyVetClient")
            .field("base_url", &self.api.base_url)
            .finish_non_exhaustive()
    }
}

/// Merge the bearer token into caller-supplied headers
///
/// Caller values for other keys are preserved; `Authorization` is always
/// overwritten.
fn set_headers(
    credentials: &CredentialRecord,
    headers: Option<HashMap<String, String>>,
) -> Result<HashMap<String, String>> {
    let bearer = credentials
        .bearer_header()
        .ok_or_else(|| Error::token_request("credential record has no access token"))?;
    let mut headers = headers.unwrap_or_default();
    headers.insert("Authorization".to_string(), bearer);
    Ok(headers)
}

#[cfg(test)]
mod tests;
