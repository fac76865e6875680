//! Postgres-backed credential store and warehouse
//!
//! Table names are qualified with the configured schema. The credential
//! read captures `now()` from the database so token staleness is judged
//! against the server clock.

use super::{CredentialStore, Warehouse};
use crate::auth::CredentialRecord;
use crate::config::WarehouseConfig;
use crate::error::{Error, Result};
use crate::types::LocationId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Credential store and warehouse over a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    /// Connect using the warehouse configuration
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let url = match &config.database_url {
            Some(url) => url.clone(),
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::missing_field("warehouse.database_url"))?,
        };
        let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn fetch(&self, location_id: LocationId) -> Result<Option<CredentialRecord>> {
        let sql = format!(
            "SELECT location_id, partner_id, client_id, client_secret, \
             access_token, access_token_create_time, now() AS system_time \
             FROM {}.ezy_vet_credentials WHERE location_id = $1",
            self.schema
        );
        let record = sqlx::query_as::<_, CredentialRecord>(&sql)
            .bind(location_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn update_token(
        &self,
        location_id: LocationId,
        access_token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {}.ezy_vet_credentials \
             SET access_token = $1, access_token_create_time = $2 \
             WHERE location_id = $3",
            self.schema
        );
        sqlx::query(&sql)
            .bind(access_token)
            .bind(created_at)
            .bind(location_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Warehouse for PgStore {
    async fn latest_appointment_watermark(
        &self,
        location_id: LocationId,
    ) -> Result<Option<DateTime<Utc>>> {
        let sql = format!(
            "SELECT max(datetime_modified) FROM {}.appointments \
             WHERE location_id = $1 AND is_shelter_animal_booking = false",
            self.schema
        );
        let watermark: Option<DateTime<Utc>> = sqlx::query_scalar(&sql)
            .bind(location_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(watermark)
    }
}
