//! Credential store and warehouse access
//!
//! Capability interfaces over the two external record stores: the
//! credential table the API client reads and conditionally writes, and the
//! warehouse the transform queries for its sync watermark. The live
//! implementation is Postgres; an in-memory implementation backs the
//! test-mode toggle.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::auth::CredentialRecord;
use crate::error::Result;
use crate::types::LocationId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Record store holding per-location API credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the credential record for a location, capturing the server's
    /// current time as `system_time`
    async fn fetch(&self, location_id: LocationId) -> Result<Option<CredentialRecord>>;

    /// Persist a refreshed token and its creation time, keyed by location
    async fn update_token(
        &self,
        location_id: LocationId,
        access_token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Warehouse queries the transform depends on
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Most recent appointment modification time loaded for a location,
    /// excluding shelter-animal bookings
    async fn latest_appointment_watermark(
        &self,
        location_id: LocationId,
    ) -> Result<Option<DateTime<Utc>>>;
}

#[cfg(test)]
mod tests;
