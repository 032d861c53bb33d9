//! Stream transformer - reshapes change-data-capture records into flat JSON.
//!
//! Reads a transform envelope (a batch of base64 change records keyed by `recordId`),
//! flattens every record's new item image into a newline-terminated JSON object and
//! writes the response envelope (`Ok` / `Dropped` / `ProcessingFailed` per record).
//!
//! Usage example (CLI):
//! ```bash
//! stream_transformer --from-stream ./data/kv/CryptoDataProcessing/stream.jsonl --deliver
//! ```
//!
//! With `--deliver` the `Ok` payloads are also written as one JSON-lines object into
//! the raw table, resolved through the catalog, where the batch job picks them up.
#![warn(missing_docs)]
mod args;
mod delivery;
mod model;
mod transform;

use crate::args::Args;
use crate::delivery::{deliver, envelope_from_stream, resolve_raw_location};
use crate::model::envelope::TransformEvent;
use crate::transform::handle;
use clap::Parser;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use trade_common::{PipelineError, Result};

fn main() -> Result<(), PipelineError> {
    init_logger();
    let args = Args::parse();

    let event = read_event(&args)?;
    info!("Received {} records", event.records.len());
    let response = handle(&event);

    let encoded = serde_json::to_vec_pretty(&response)?;
    match &args.output {
        Some(path) => fs::write(path, &encoded)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&encoded)?;
            stdout.write_all(b"\n")?;
        }
    }

    if args.deliver || args.deliver_to.is_some() {
        let dir = match &args.deliver_to {
            Some(dir) => dir.clone(),
            None => resolve_raw_location(&args.catalog, &args.database, &args.table, &args.raw_path)?,
        };
        deliver(&response, &dir)?;
    }
    Ok(())
}

fn read_event(args: &Args) -> Result<TransformEvent> {
    if let Some(path) = &args.from_stream {
        return envelope_from_stream(BufReader::new(File::open(path)?));
    }
    let raw = match &args.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_slice(&raw)?)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
