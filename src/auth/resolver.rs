//! Credential resolution
//!
//! Read-then-conditional-write against the credential store: fetch the
//! record for a location, refresh the bearer token through the issuer when
//! it has aged past the cache TTL, persist the new token with the
//! server-observed time as its creation timestamp. Concurrent callers for
//! the same location can race and redundantly refresh; last write wins.

use super::issuer::TokenIssuer;
use super::types::CredentialRecord;
use crate::error::{Error, Result};
use crate::store::CredentialStore;
use crate::types::LocationId;
use std::sync::Arc;
use tracing::debug;

/// Resolves a location ID to a credential record with a valid bearer token
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
    cache_ttl_minutes: i64,
}

impl CredentialResolver {
    /// Create a resolver over a store and issuer
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: Arc<dyn TokenIssuer>,
        cache_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            issuer,
            cache_ttl_minutes,
        }
    }

    /// Fetch credentials for a location, refreshing the token if needed
    pub async fn resolve(&self, location_id: LocationId) -> Result<CredentialRecord> {
        let mut credentials = self
            .store
            .fetch(location_id)
            .await?
            .ok_or(Error::MissingCredentials { location_id })?;

        if credentials.token_is_stale(self.cache_ttl_minutes) {
            debug!("Access token for location {location_id} is stale, refreshing");
            let token = self.issuer.fetch_token(&credentials).await?;
            self.store
                .update_token(location_id, &token, credentials.system_time)
                .await?;
            credentials.access_token_create_time = Some(credentials.system_time);
            credentials.access_token = Some(token);
        }

        Ok(credentials)
    }
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("cache_ttl_minutes", &self.cache_ttl_minutes)
            .finish_non_exhaustive()
    }
}
