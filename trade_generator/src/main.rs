//! Synthetic trade generator.
//!
//! Writes fake cryptocurrency trades into a key-value table at random intervals. It
//! wires together two building blocks:
//!
//! - `TradeGenerator` - a background thread producing `TradeEvent`s over a
//!   `crossbeam_channel`, pausing a random number of seconds between trades.
//! - `LocalTable` - the key-value table (`ItemStore`) each trade is put into; every put
//!   also lands on the table's change stream for the stream transformer to pick up.
//!
//! The main thread `select!`s over generated trades and a shutdown channel fed by the
//! Ctrl+C handler, and stops early once `--count` trades were published.
//!
//! Usage example (CLI):
//! ```bash
//! trade_generator --store-dir ./data/kv --count 20 --min-delay 0 --max-delay 1
//! ```
#![warn(missing_docs)]
use crate::args::Args;
use crate::model::trade_generator::{TradeEvent, TradeGenerator};
use crate::store::{ItemStore, LocalTable, PutOutcome};
use clap::Parser;
use crossbeam_channel::{bounded, select};
use log::{info, warn};
use trade_common::defaults::KV_KEY_ATTRIBUTE;
use trade_common::{PipelineError, Result, Trade};

mod args;
pub mod model;
mod store;

/// Put one trade into `store` and log it.
pub fn publish_transaction<S: ItemStore>(store: &mut S, trade: &Trade) -> Result<PutOutcome> {
    let outcome = store.put_item(trade.to_item())?;
    info!("Inserted transaction: {}", serde_json::to_string(trade)?);
    Ok(outcome)
}

fn main() -> Result<(), PipelineError> {
    init_logger();
    let args = Args::parse();
    args.validate()?;

    let mut table = LocalTable::open(&args.store_dir.join(&args.table), KV_KEY_ATTRIBUTE, &args.region)?;

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down generator...");
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| PipelineError::Format(format!("failed to set Ctrl+C handler: {}", e)))?;

    // Kept alive for the whole run; the generator stops when it is dropped.
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let events = TradeGenerator::new(args.min_delay..=args.max_delay, args.exchanges())?.start(stop_rx);

    let mut published: u64 = 0;
    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(TradeEvent::Trade(trade)) => {
                    publish_transaction(&mut table, &trade)?;
                    published += 1;
                    if args.count.is_some_and(|limit| published >= limit) {
                        break;
                    }
                }
                Ok(TradeEvent::Shutdown) => break,
                Err(e) => {
                    warn!("Trade generator channel closed: {}", e);
                    break;
                }
            },
            recv(shutdown_rx) -> _ => break,
        }
    }
    drop(stop_tx);

    info!(
        "Published {} transactions; {} items in {}",
        published,
        table.len(),
        table.dir().display()
    );
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;
    use trade_common::attribute::AttributeValue;
    use trade_common::trade::Exchange;

    #[test]
    fn test_publish_transaction_stores_item_by_id() {
        let tmp = TempDir::new().unwrap();
        let mut table = LocalTable::open(tmp.path(), KV_KEY_ATTRIBUTE, "ap-south-1").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let trade = model::mock::generate_mock_transaction(&mut rng, &Exchange::ALL);

        assert_eq!(publish_transaction(&mut table, &trade).unwrap(), PutOutcome::Inserted);
        let stored = table.get_item(&trade.transaction_id).unwrap();
        assert_eq!(stored["price"], AttributeValue::N(trade.price.to_string()));
        assert_eq!(stored["exchange"], AttributeValue::S(trade.exchange.to_string()));
    }
}
