//! Batch trade enrichment job.
//!
//! Reads raw trade events from a catalogued source table, derives the business-rule
//! columns and upserts the result into a partitioned, keyed table:
//!
//! - `source` - reads the raw table's JSON objects through the catalog.
//! - `cast` / `rules` / `transform` - decimal casts, rule columns and the validity filter.
//! - `table` - copy-on-write upsert table (record key `transaction_id`, partitioned by
//!   `exchange`, versioned by `timestamp`).
//! - `job` - wires the above together and syncs the target table into the catalog.
//!
//! Usage example (CLI):
//! ```bash
//! batch_etl --catalog ./data/catalog.json --target-path ./data/crypto_processed
//! ```
#![warn(missing_docs)]
mod args;
mod cast;
mod job;
mod rules;
mod source;
mod table;
mod transform;

use crate::args::Args;
use clap::Parser;
use log::{error, info};
use trade_common::{PipelineError, Result};

fn main() -> Result<(), PipelineError> {
    init_logger();
    let args = Args::parse();
    info!(
        "Processing {}.{} into {}.{}",
        args.source_database, args.source_table, args.target_database, args.target_table
    );

    match job::run(&args) {
        Ok(report) => {
            info!(
                "Read {} rows, filtered {}, {} inserted, {} updated across {} partitions",
                report.read,
                report.filtered,
                report.commit.inserted,
                report.commit.updated,
                report.commit.partitions.len()
            );
            info!("Upsert completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Batch job failed: {}", e);
            Err(e)
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
