//! Configuration types for the sync service
//!
//! All settings load from YAML with serde defaults and are validated once
//! at load time, so a bad base URL or an unconfigured location fails the
//! run before any network call is made.

use crate::error::{Error, Result};
use crate::types::LocationId;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Credential store / warehouse settings
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Per-location settings, keyed by location ID
    #[serde(default = "default_locations")]
    pub locations: HashMap<LocationId, LocationSettings>,

    /// When set, the runner substitutes an in-memory store for the live
    /// database connection
    #[serde(default)]
    pub test_mode: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            warehouse: WarehouseConfig::default(),
            locations: default_locations(),
            test_mode: false,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a YAML file and validate it
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string and validate it
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api.base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "api.base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if self.api.token_cache_ttl_minutes <= 0 {
            return Err(Error::invalid_value(
                "api.token_cache_ttl_minutes",
                "must be positive",
            ));
        }
        if self.api.oauth_scope.trim().is_empty() {
            return Err(Error::missing_field("api.oauth_scope"));
        }
        if self.locations.is_empty() {
            return Err(Error::missing_field("locations"));
        }
        if self.warehouse.schema.trim().is_empty() {
            return Err(Error::missing_field("warehouse.schema"));
        }
        Ok(())
    }

    /// Look up the settings for a location
    pub fn location(&self, location_id: LocationId) -> Result<&LocationSettings> {
        self.locations
            .get(&location_id)
            .ok_or(Error::UnknownLocation { location_id })
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for API requests, with trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Sleep before the single transport retry, in seconds
    #[serde(default = "default_retry_sleep")]
    pub retry_sleep_seconds: u64,

    /// Maximum age of a cached bearer token before refresh, in minutes
    #[serde(default = "default_token_ttl")]
    pub token_cache_ttl_minutes: i64,

    /// Scope string sent with token requests
    #[serde(default = "default_oauth_scope")]
    pub oauth_scope: String,

    /// Request pacing, None to disable
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            retry_sleep_seconds: default_retry_sleep(),
            token_cache_ttl_minutes: default_token_ttl(),
            oauth_scope: default_oauth_scope(),
            rate_limit: default_rate_limit(),
        }
    }
}

impl ApiConfig {
    /// Join an endpoint path onto the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

fn default_base_url() -> String {
    "https://api.ezyvet.com/".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_sleep() -> u64 {
    60
}

fn default_token_ttl() -> i64 {
    10
}

fn default_oauth_scope() -> String {
    DEFAULT_OAUTH_SCOPE.to_string()
}

fn default_rate_limit() -> Option<RateLimitConfig> {
    Some(RateLimitConfig::default())
}

/// Read scopes requested with each access token. The API rejects tokens
/// used against resources outside their granted scope, so this covers every
/// resource the sync reads.
pub const DEFAULT_OAUTH_SCOPE: &str = "read-receiveinvoice,read-diagnosticrequest,read-tagcategory,read-systemsetting,read-contactdetailtype,read-shelteranimalbooking,read-stocktransaction,read-webhookevents,read-presentingproblem,read-purchaseorder,read-country,read-productsupplier,read-animal,read-payment,read-consult,read-presentingproblemlink,read-ledgeraccount,read-diagnostic,read-therapeutic,read-diagnosticresultitem,read-address,read-species,read-plan,read-purchaseorderitem,read-wellnessplanmembership,read-vaccination,read-productminimumstock,read-transaction,read-integrateddiagnostic,read-stockadjustmentitem,read-wellnessplanmembershipstatusperiod,read-tag,read-invoice,read-contact,read-sex,read-animalcolour,read-batch,read-assessment,read-healthstatus,read-breed,read-invoiceline,read-wellnessplanbenefit,read-receiveinvoiceitem,read-separation,read-priceadjustment,read-user,read-resource,read-prescriptionitem,read-prescription,read-physicalexam,read-billingcredit,read-appointmentstatus,read-paymentmethod,read-tagname,read-taxrate,read-communication,read-wellnessplanmembershipoption,read-stockadjustment,read-appointmenttype,read-productgroup,read-webhooks,read-product,read-operation,read-history,read-diagnosticresult,read-paymentallocation,read-attachment,read-contactdetail,read-productpricing,read-contactassociation,read-wellnessplanbenefititem,read-appointment,read-jobqueue,read-wellnessplan";

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size (max tokens in bucket)
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    10
}

// ============================================================================
// Warehouse Config
// ============================================================================

/// Credential store / warehouse settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Schema holding the `ezy_vet_credentials` and `appointments` tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Postgres connection string; falls back to `DATABASE_URL`
    #[serde(default)]
    pub database_url: Option<String>,

    /// Window to fetch when the warehouse has no watermark yet, in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            database_url: None,
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_schema() -> String {
    "data".to_string()
}

fn default_lookback_days() -> i64 {
    30
}

// ============================================================================
// Per-Location Settings
// ============================================================================

/// Settings for a single practice location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSettings {
    /// Division the location reports under
    pub division_id: i64,

    /// Appointment type IDs that are block-out bookings, dropped from the
    /// appointments table
    #[serde(default)]
    pub block_out_types: Vec<i64>,

    /// Appointment type IDs counted as medical
    #[serde(default)]
    pub medical_types: Vec<i64>,
}

impl LocationSettings {
    /// Whether the appointment type is a block-out booking
    pub fn is_block_out(&self, type_id: i64) -> bool {
        self.block_out_types.contains(&type_id)
    }

    /// Whether the appointment type counts as medical
    pub fn is_medical(&self, type_id: i64) -> bool {
        self.medical_types.contains(&type_id)
    }
}

/// Built-in per-location settings for the current fleet. Overridden by the
/// `locations` table in the YAML config.
static BUILTIN_LOCATIONS: Lazy<HashMap<LocationId, LocationSettings>> = Lazy::new(|| {
    let entries: [(i64, &[i64]); 7] = [
        (2, &[18, 26, 27, 28, 31, 32, 33, 34, 35, 37, 39, 40, 41, 56, 59, 60]),
        (3, &[18, 23, 28, 29, 30, 32, 33, 34, 35, 36, 37, 38, 40, 59, 60, 61]),
        (4, &[]),
        (5, &[18, 26, 27, 28, 31, 32, 33, 34, 35, 39, 91, 104, 107, 109, 110, 111]),
        (6, &[18, 26, 27, 28, 29, 30, 31, 32, 33, 34, 39, 40, 42, 55, 56, 57, 63, 64]),
        (7, &[18, 42, 43, 46, 56, 59, 60, 62, 65, 67, 68, 70, 72, 74, 76, 78]),
        (8, &[18, 43, 47, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 65, 66, 67]),
    ];
    entries
        .into_iter()
        .map(|(id, medical)| {
            (
                id,
                LocationSettings {
                    division_id: id,
                    block_out_types: vec![2, 4],
                    medical_types: medical.to_vec(),
                },
            )
        })
        .collect()
});

fn default_locations() -> HashMap<LocationId, LocationSettings> {
    BUILTIN_LOCATIONS.clone()
}
