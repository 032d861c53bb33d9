//! Command-line arguments for the stream transformer.
use clap::Parser;
use std::path::PathBuf;
use trade_common::defaults::{CATALOG_PATH, SOURCE_DATABASE, SOURCE_PATH, SOURCE_TABLE};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Transform event (JSON envelope) to process. Read from stdin when neither this nor
    /// `--from-stream` is given.
    #[clap(long, conflicts_with = "from_stream")]
    pub input: Option<PathBuf>,

    /// Change stream file (one change record per line) to wrap into an envelope.
    #[clap(long)]
    pub from_stream: Option<PathBuf>,

    /// Where to write the response envelope. Stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Deliver transformed records into the raw table.
    #[clap(long)]
    pub deliver: bool,

    /// Deliver into this directory instead of the catalogued raw table location.
    #[clap(long)]
    pub deliver_to: Option<PathBuf>,

    /// Catalog file used to resolve the raw table.
    #[clap(long, default_value = CATALOG_PATH)]
    pub catalog: PathBuf,

    /// Database of the raw table.
    #[clap(long, default_value = SOURCE_DATABASE)]
    pub database: String,

    /// Raw table name.
    #[clap(long, default_value = SOURCE_TABLE)]
    pub table: String,

    /// Location the raw table is registered at when the catalog does not know it.
    #[clap(long, default_value = SOURCE_PATH)]
    pub raw_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_conflicts_with_stream() {
        let parsed = Args::try_parse_from([
            "stream_transformer",
            "--input",
            "a.json",
            "--from-stream",
            "b.jsonl",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["stream_transformer", "--deliver"]);
        assert!(args.deliver);
        assert_eq!(args.table, "crypto_raw");
        assert_eq!(args.catalog, PathBuf::from(CATALOG_PATH));
    }
}
