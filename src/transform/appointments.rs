//! Appointments ETL
//!
//! `AppointmentsJob::run` is the controller: derive the date range, fetch
//! raw appointments, drop block-out bookings, translate code fields, join
//! resource data, derive computed columns, project to the output shape.
//! Any step failing aborts the whole call; there is no row-level recovery.

use crate::client::{EzyVetClient, ParamValue, Params};
use crate::config::{LocationSettings, SyncConfig};
use crate::error::{Error, Result};
use crate::store::Warehouse;
use crate::types::{field, field_i64, field_string, JsonObject, JsonValueExt, LocationId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Maximum characters kept in the description column
pub const DESCRIPTION_MAX_CHARS: usize = 1999;

// ============================================================================
// Output row
// ============================================================================

/// One cleaned appointment row, projected to the warehouse column set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub location_id: i64,
    pub division_id: i64,
    /// Remote `id`, renamed to avoid colliding with the warehouse key
    pub ezyvet_id: i64,
    pub created_at: i64,
    pub modified_at: i64,
    pub active: i32,
    pub start_at: i64,
    /// Human-readable appointment type
    pub type_id: String,
    /// Human-readable appointment status
    pub status_id: String,
    pub description: Option<String>,
    pub cancellation_reason: Option<String>,
    pub animal_id: Option<i64>,
    pub consult_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub sales_resource: Option<i64>,
    pub resource_id: Option<i64>,
    pub ownership_id: Option<i64>,
    pub primary_resource_name: Option<String>,
    pub sales_resource_name: Option<String>,
    pub datetime_created: DateTime<Utc>,
    pub datetime_modified: DateTime<Utc>,
    pub datetime_start_at: DateTime<Utc>,
    pub is_medical: i32,
    /// Raw numeric appointment type, preserved alongside the translation
    pub appt_type_id: i64,
    /// Raw numeric appointment status, preserved alongside the translation
    pub appt_status_id: i64,
    /// Populated by a later warehouse process, always null here
    pub first_appt: Option<bool>,
    pub is_shelter_animal_booking: bool,
}

// ============================================================================
// Raw record
// ============================================================================

/// An appointment as the API returns it, after lenient field extraction
#[derive(Debug, Clone)]
pub(crate) struct RawAppointment {
    pub ezyvet_id: i64,
    pub active: i32,
    pub created_at: i64,
    pub modified_at: i64,
    pub start_at: i64,
    pub type_id: i64,
    pub status_id: i64,
    pub description: Option<String>,
    pub cancellation_reason: Option<String>,
    pub animal_id: Option<i64>,
    pub consult_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub sales_resource: Option<i64>,
    /// `id` of the first entry of the `resources` list field
    pub resource_id: Option<i64>,
}

impl RawAppointment {
    pub(crate) fn from_record(record: &JsonObject) -> Result<Self> {
        let require = |name: &str| {
            field_i64(record, name)
                .ok_or_else(|| Error::malformed(format!("appointment record missing '{name}'")))
        };

        let active = field(record, "active")
            .and_then(JsonValueExt::as_bool_int)
            .ok_or_else(|| Error::malformed("appointment record missing 'active'"))?;

        Ok(Self {
            ezyvet_id: require("id")?,
            active,
            created_at: require("created_at")?,
            modified_at: require("modified_at")?,
            start_at: require("start_at")?,
            type_id: require("type_id")?,
            status_id: require("status_id")?,
            description: field_string(record, "description"),
            cancellation_reason: field_string(record, "cancellation_reason"),
            animal_id: field_i64(record, "animal_id"),
            consult_id: field_i64(record, "consult_id"),
            contact_id: field_i64(record, "contact_id"),
            sales_resource: field_i64(record, "sales_resource"),
            resource_id: primary_resource_id(record)?,
        })
    }
}

/// Extract the first resource reference, when the list is present
fn primary_resource_id(record: &JsonObject) -> Result<Option<i64>> {
    let Some(resources) = field(record, "resources").and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    let Some(first) = resources.first() else {
        return Ok(None);
    };
    first
        .get("id")
        .and_then(JsonValueExt::as_i64_lenient)
        .map(Some)
        .ok_or_else(|| Error::malformed("resources entry has no usable 'id'"))
}

// ============================================================================
// Lookups
// ============================================================================

/// Resource ownership and naming, fetched once per run
#[derive(Debug, Clone)]
pub(crate) struct ResourceInfo {
    pub ownership_id: Option<i64>,
    pub name: Option<String>,
}

/// Translation tables and the resource join, fetched once per run
pub(crate) struct Lookups {
    pub type_names: HashMap<i64, String>,
    pub status_names: HashMap<i64, String>,
    pub resources: HashMap<i64, ResourceInfo>,
}

// ============================================================================
// Job
// ============================================================================

/// ETL job loading appointments for one location
pub struct AppointmentsJob {
    client: Arc<EzyVetClient>,
    warehouse: Arc<dyn Warehouse>,
    location_id: LocationId,
    settings: LocationSettings,
    lookback_days: i64,
}

impl AppointmentsJob {
    /// Create a job; fails up front when the location has no settings
    pub fn new(
        client: Arc<EzyVetClient>,
        warehouse: Arc<dyn Warehouse>,
        config: &SyncConfig,
        location_id: LocationId,
    ) -> Result<Self> {
        let settings = config.location(location_id)?.clone();
        Ok(Self {
            client,
            warehouse,
            location_id,
            settings,
            lookback_days: config.warehouse.lookback_days,
        })
    }

    /// Fetch and clean appointments for the date range
    ///
    /// When either bound is missing the whole range is derived from the
    /// warehouse watermark. Returns `Ok(None)` when the API reports no
    /// data for the range.
    pub async fn run(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Vec<Appointment>>> {
        info!("Starting appointments load for location {}", self.location_id);

        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => self.derive_date_range().await?,
        };

        let mut params = Params::new();
        params.insert("active".to_string(), ParamValue::Bool(true));

        let Some(records) = self
            .client
            .get_date_range(
                self.location_id,
                "v2",
                "appointment",
                "modified_at",
                Some(params),
                Some(start_date),
                Some(end_date),
                None,
            )
            .await?
        else {
            info!("No appointments returned for location {}", self.location_id);
            return Ok(None);
        };

        let raw = records
            .iter()
            .map(RawAppointment::from_record)
            .collect::<Result<Vec<_>>>()?;
        let kept = remove_block_out_bookings(raw, &self.settings);

        let lookups = self.fetch_lookups().await?;
        let rows = kept
            .iter()
            .map(|raw| build_row(raw, self.location_id, &self.settings, &lookups))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} appointments for location {}",
            rows.len(),
            self.location_id
        );
        Ok(Some(rows))
    }

    /// Derive (start, end) from the warehouse watermark
    async fn derive_date_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let end = Utc::now();
        let start = match self
            .warehouse
            .latest_appointment_watermark(self.location_id)
            .await?
        {
            Some(watermark) => watermark,
            None => end - Duration::days(self.lookback_days),
        };
        Ok((start, end))
    }

    async fn fetch_lookups(&self) -> Result<Lookups> {
        let type_names = self
            .client
            .get_translation(self.location_id, "v1", "appointmenttype")
            .await?;
        let status_names = self
            .client
            .get_translation(self.location_id, "v1", "appointmentstatus")
            .await?;
        let resources = self.fetch_resources().await?;
        Ok(Lookups {
            type_names,
            status_names,
            resources,
        })
    }

    /// Fetch the resource lookup once for the whole location
    async fn fetch_resources(&self) -> Result<HashMap<i64, ResourceInfo>> {
        let records = self
            .client
            .get(self.location_id, "v1", "resource", None, None)
            .await?
            .unwrap_or_default();

        let mut table = HashMap::with_capacity(records.len());
        for record in &records {
            let id = field_i64(record, "id")
                .ok_or_else(|| Error::malformed("resource record has no usable 'id'"))?;
            table.insert(
                id,
                ResourceInfo {
                    ownership_id: field_i64(record, "ownership_id"),
                    name: field_string(record, "name"),
                },
            );
        }
        Ok(table)
    }
}

impl std::fmt::Debug for AppointmentsJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppointmentsJob")
            .field("location_id", &self.location_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Cleaning steps
// ============================================================================

/// Drop block-out bookings for the location
pub(crate) fn remove_block_out_bookings(
    raw: Vec<RawAppointment>,
    settings: &LocationSettings,
) -> Vec<RawAppointment> {
    raw.into_iter()
        .filter(|appointment| !settings.is_block_out(appointment.type_id))
        .collect()
}

/// Translate a code through a lookup table
///
/// Codes missing from the table pass through as their numeric text rather
/// than failing the row.
pub(crate) fn translate(code: i64, table: &HashMap<i64, String>) -> String {
    table
        .get(&code)
        .cloned()
        .unwrap_or_else(|| code.to_string())
}

/// Truncate a description to the warehouse column width
pub(crate) fn truncate_description(description: Option<String>) -> Option<String> {
    description.map(|text| {
        if text.chars().count() > DESCRIPTION_MAX_CHARS {
            text.chars().take(DESCRIPTION_MAX_CHARS).collect()
        } else {
            text
        }
    })
}

fn utc_from_epoch(seconds: i64, name: &str) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::malformed(format!("'{name}' timestamp {seconds} out of range")))
}

/// Project one raw appointment to the cleaned output row
pub(crate) fn build_row(
    raw: &RawAppointment,
    location_id: LocationId,
    settings: &LocationSettings,
    lookups: &Lookups,
) -> Result<Appointment> {
    let (ownership_id, primary_resource_name) = match raw.resource_id {
        Some(resource_id) => {
            let resource = lookups
                .resources
                .get(&resource_id)
                .ok_or_else(|| Error::missing_lookup("resource", resource_id))?;
            (resource.ownership_id, resource.name.clone())
        }
        None => (None, None),
    };

    let sales_resource_name = match raw.sales_resource {
        Some(sales_resource) => lookups
            .resources
            .get(&sales_resource)
            .ok_or_else(|| Error::missing_lookup("resource", sales_resource))?
            .name
            .clone(),
        None => None,
    };

    Ok(Appointment {
        location_id,
        division_id: settings.division_id,
        ezyvet_id: raw.ezyvet_id,
        created_at: raw.created_at,
        modified_at: raw.modified_at,
        active: raw.active,
        start_at: raw.start_at,
        type_id: translate(raw.type_id, &lookups.type_names),
        status_id: translate(raw.status_id, &lookups.status_names),
        description: truncate_description(raw.description.clone()),
        cancellation_reason: raw.cancellation_reason.clone(),
        animal_id: raw.animal_id,
        consult_id: raw.consult_id,
        contact_id: raw.contact_id,
        sales_resource: raw.sales_resource,
        resource_id: raw.resource_id,
        ownership_id,
        primary_resource_name,
        sales_resource_name,
        datetime_created: utc_from_epoch(raw.created_at, "created_at")?,
        datetime_modified: utc_from_epoch(raw.modified_at, "modified_at")?,
        datetime_start_at: utc_from_epoch(raw.start_at, "start_at")?,
        is_medical: i32::from(settings.is_medical(raw.type_id)),
        appt_type_id: raw.type_id,
        appt_status_id: raw.status_id,
        first_appt: None,
        is_shelter_animal_booking: false,
    })
}
