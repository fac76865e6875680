//! Output module
//!
//! Converts cleaned appointment rows into Arrow RecordBatches and writes
//! Parquet files for warehouse loading.

mod table;
mod writer;

pub use table::{appointments_schema, appointments_to_batch};
pub use writer::{
    write_appointments_to_parquet, write_batch_to_parquet, ParquetWriter, ParquetWriterConfig,
};
