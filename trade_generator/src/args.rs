//! Command-line arguments for the trade generator.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use std::path::PathBuf;
use trade_common::defaults::{KV_REGION, KV_STORE_DIR, KV_TABLE_NAME, MAX_DELAY_SECS, MIN_DELAY_SECS};
use trade_common::trade::Exchange;
use trade_common::PipelineError;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding the local key-value tables.
    #[clap(long, default_value = KV_STORE_DIR)]
    pub store_dir: PathBuf,

    /// Table the trades are written to.
    #[clap(long, default_value = KV_TABLE_NAME)]
    pub table: String,

    /// Region label stamped on change records.
    #[clap(long, default_value = KV_REGION)]
    pub region: String,

    /// Shortest pause between two trades, in seconds.
    #[clap(long, default_value_t = MIN_DELAY_SECS)]
    pub min_delay: u64,

    /// Longest pause between two trades, in seconds (inclusive).
    #[clap(long, default_value_t = MAX_DELAY_SECS)]
    pub max_delay: u64,

    /// Stop after this many trades. Runs until Ctrl+C when omitted.
    #[clap(long)]
    pub count: Option<u64>,

    /// Restrict generated trades to these exchanges.
    #[clap(long, value_enum, value_delimiter = ',')]
    pub exchanges: Vec<Exchange>,
}

impl Args {
    /// Reject inconsistent delay bounds.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_delay > self.max_delay {
            return Err(PipelineError::Format(format!(
                "--min-delay ({}) must not exceed --max-delay ({})",
                self.min_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Exchanges to draw from; all of them when none were given.
    pub fn exchanges(&self) -> Vec<Exchange> {
        if self.exchanges.is_empty() {
            Exchange::ALL.to_vec()
        } else {
            self.exchanges.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["trade_generator"]);
        assert_eq!(args.table, KV_TABLE_NAME);
        assert_eq!(args.min_delay, 1);
        assert_eq!(args.max_delay, 5);
        assert_eq!(args.exchanges().len(), 6);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_exchange_filter_and_bounds() {
        let args = Args::parse_from([
            "trade_generator",
            "--exchanges",
            "kraken,okx",
            "--min-delay",
            "3",
            "--max-delay",
            "2",
        ]);
        assert_eq!(args.exchanges(), vec![Exchange::Kraken, Exchange::OKX]);
        assert!(args.validate().is_err());
    }
}
