//! Command-line arguments for the batch job.
use clap::Parser;
use std::path::PathBuf;
use trade_common::defaults::{
    CATALOG_PATH, SOURCE_DATABASE, SOURCE_TABLE, TARGET_DATABASE, TARGET_PATH, TARGET_TABLE,
};

/// Parsed command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Catalog file.
    #[clap(long, default_value = CATALOG_PATH)]
    pub catalog: PathBuf,

    /// Database of the raw table.
    #[clap(long, default_value = SOURCE_DATABASE)]
    pub source_database: String,

    /// Raw table name.
    #[clap(long, default_value = SOURCE_TABLE)]
    pub source_table: String,

    /// Database of the processed table (created if missing).
    #[clap(long, default_value = TARGET_DATABASE)]
    pub target_database: String,

    /// Processed table name.
    #[clap(long, default_value = TARGET_TABLE)]
    pub target_table: String,

    /// Location of the processed table.
    #[clap(long, default_value = TARGET_PATH)]
    pub target_path: PathBuf,
}
