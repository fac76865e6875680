//! In-memory store for the test-mode toggle
//!
//! Substitutes for the live database in unit tests and dry runs. Tracks
//! how many token updates have been applied so tests can assert the
//! refresh-exactly-once behavior.

use super::{CredentialStore, Warehouse};
use crate::auth::CredentialRecord;
use crate::error::Result;
use crate::types::LocationId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory credential store and warehouse
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<LocationId, CredentialRecord>>,
    watermarks: RwLock<HashMap<LocationId, DateTime<Utc>>>,
    token_updates: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a credential record
    pub async fn insert(&self, record: CredentialRecord) {
        let mut records = self.records.write().await;
        records.insert(record.location_id, record);
    }

    /// Seed a warehouse watermark
    pub async fn set_watermark(&self, location_id: LocationId, watermark: DateTime<Utc>) {
        let mut watermarks = self.watermarks.write().await;
        watermarks.insert(location_id, watermark);
    }

    /// Number of token updates applied so far
    pub fn token_updates(&self) -> usize {
        self.token_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn fetch(&self, location_id: LocationId) -> Result<Option<CredentialRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&location_id).cloned())
    }

    async fn update_token(
        &self,
        location_id: LocationId,
        access_token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&location_id) {
            record.access_token = Some(access_token.to_string());
            record.access_token_create_time = Some(created_at);
        }
        self.token_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Warehouse for MemoryStore {
    async fn latest_appointment_watermark(
        &self,
        location_id: LocationId,
    ) -> Result<Option<DateTime<Utc>>> {
        let watermarks = self.watermarks.read().await;
        Ok(watermarks.get(&location_id).copied())
    }
}
