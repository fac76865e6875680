//! CLI commands and argument parsing

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ezyVet appointments sync CLI
#[derive(Parser, Debug)]
#[command(name = "ezyvet-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and clean appointments for a location
    Appointments {
        /// Location ID to operate on
        #[arg(short, long)]
        location_id: i64,

        /// Start of the date range (RFC 3339); derived from the warehouse
        /// watermark when omitted
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// End of the date range (RFC 3339)
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Write the cleaned rows to a Parquet file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify credentials and API connectivity for a location
    Check {
        /// Location ID to operate on
        #[arg(short, long)]
        location_id: i64,
    },
}
