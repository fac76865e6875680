//! Arrow representation of the appointments table
//!
//! The schema is fixed rather than inferred: the warehouse table has a
//! settled column set and the loader depends on stable types.

use crate::error::Result;
use crate::transform::Appointment;
use arrow::array::{
    ArrayRef, BooleanArray, Int32Array, Int64Array, StringArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

fn utc_timestamp() -> DataType {
    DataType::Timestamp(TimeUnit::Second, Some("UTC".into()))
}

/// The fixed schema of the cleaned appointments table
pub fn appointments_schema() -> Schema {
    Schema::new(vec![
        Field::new("location_id", DataType::Int64, false),
        Field::new("division_id", DataType::Int64, false),
        Field::new("ezyvet_id", DataType::Int64, false),
        Field::new("created_at", DataType::Int64, false),
        Field::new("modified_at", DataType::Int64, false),
        Field::new("active", DataType::Int32, false),
        Field::new("start_at", DataType::Int64, false),
        Field::new("type_id", DataType::Utf8, false),
        Field::new("status_id", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, true),
        Field::new("cancellation_reason", DataType::Utf8, true),
        Field::new("animal_id", DataType::Int64, true),
        Field::new("consult_id", DataType::Int64, true),
        Field::new("contact_id", DataType::Int64, true),
        Field::new("sales_resource", DataType::Int64, true),
        Field::new("resource_id", DataType::Int64, true),
        Field::new("ownership_id", DataType::Int64, true),
        Field::new("primary_resource_name", DataType::Utf8, true),
        Field::new("sales_resource_name", DataType::Utf8, true),
        Field::new("datetime_created", utc_timestamp(), false),
        Field::new("datetime_modified", utc_timestamp(), false),
        Field::new("datetime_start_at", utc_timestamp(), false),
        Field::new("is_medical", DataType::Int32, false),
        Field::new("appt_type_id", DataType::Int64, false),
        Field::new("appt_status_id", DataType::Int64, false),
        Field::new("first_appt", DataType::Boolean, true),
        Field::new("is_shelter_animal_booking", DataType::Boolean, false),
    ])
}

/// Convert cleaned rows into a RecordBatch with the fixed schema
pub fn appointments_to_batch(rows: &[Appointment]) -> Result<RecordBatch> {
    let i64_col = |f: fn(&Appointment) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(rows.iter().map(f)))
    };
    let opt_i64_col = |f: fn(&Appointment) -> Option<i64>| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let i32_col = |f: fn(&Appointment) -> i32| -> ArrayRef {
        Arc::new(Int32Array::from_iter_values(rows.iter().map(f)))
    };
    let str_col = |f: fn(&Appointment) -> String| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
    };
    let opt_str_col = |f: fn(&Appointment) -> Option<String>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let ts_col = |f: fn(&Appointment) -> i64| -> ArrayRef {
        Arc::new(
            TimestampSecondArray::from_iter_values(rows.iter().map(f)).with_timezone("UTC"),
        )
    };

    let columns: Vec<ArrayRef> = vec![
        i64_col(|r| r.location_id),
        i64_col(|r| r.division_id),
        i64_col(|r| r.ezyvet_id),
        i64_col(|r| r.created_at),
        i64_col(|r| r.modified_at),
        i32_col(|r| r.active),
        i64_col(|r| r.start_at),
        str_col(|r| r.type_id.clone()),
        str_col(|r| r.status_id.clone()),
        opt_str_col(|r| r.description.clone()),
        opt_str_col(|r| r.cancellation_reason.clone()),
        opt_i64_col(|r| r.animal_id),
        opt_i64_col(|r| r.consult_id),
        opt_i64_col(|r| r.contact_id),
        opt_i64_col(|r| r.sales_resource),
        opt_i64_col(|r| r.resource_id),
        opt_i64_col(|r| r.ownership_id),
        opt_str_col(|r| r.primary_resource_name.clone()),
        opt_str_col(|r| r.sales_resource_name.clone()),
        ts_col(|r| r.datetime_created.timestamp()),
        ts_col(|r| r.datetime_modified.timestamp()),
        ts_col(|r| r.datetime_start_at.timestamp()),
        i32_col(|r| r.is_medical),
        i64_col(|r| r.appt_type_id),
        i64_col(|r| r.appt_status_id),
        Arc::new(BooleanArray::from(
            rows.iter().map(|r| r.first_appt).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            rows.iter()
                .map(|r| Some(r.is_shelter_animal_booking))
                .collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(Arc::new(appointments_schema()), columns)?;
    Ok(batch)
}
