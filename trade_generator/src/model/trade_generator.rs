//! Background trade generator.
//!
//! The `TradeGenerator` runs a thread that builds a mock `Trade`, hands it to the
//! consumer over a `crossbeam_channel`, then sleeps a random whole number of seconds
//! drawn from its delay range before the next one.
//!
//! Event model:
//! - `TradeEvent::Trade(Trade)` - a freshly generated trade.
//! - `TradeEvent::Shutdown` - the generator stopped (its stop channel fired or closed).
//!
//! The thread also exits quietly once the consumer drops its receiver.

use crate::model::mock::generate_mock_transaction;
use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use log::{debug, info};
use rand::Rng;
use std::ops::RangeInclusive;
use std::thread;
use std::time::Duration;
use trade_common::{PipelineError, Result, Trade};
use trade_common::trade::Exchange;

/// Message sent by the generator to its consumer.
#[derive(Debug, Clone)]
pub enum TradeEvent {
    /// New trade to publish.
    Trade(Trade),
    /// No more trades will follow.
    Shutdown,
}

/// Emits mock trades at random intervals on a background thread.
pub struct TradeGenerator {
    delay_secs: RangeInclusive<u64>,
    exchanges: Vec<Exchange>,
}

impl TradeGenerator {
    /// Create a generator pausing `delay_secs` (inclusive, whole seconds) between trades.
    ///
    /// Fails when the delay range is empty.
    pub fn new(delay_secs: RangeInclusive<u64>, exchanges: Vec<Exchange>) -> Result<Self> {
        if delay_secs.is_empty() {
            return Err(PipelineError::Format(format!(
                "empty delay range {}..={} seconds",
                delay_secs.start(),
                delay_secs.end()
            )));
        }
        let exchanges = if exchanges.is_empty() {
            Exchange::ALL.to_vec()
        } else {
            exchanges
        };
        Ok(Self { delay_secs, exchanges })
    }

    /// Start the generator thread and return the channel trades arrive on.
    ///
    /// A message on `stop_rx`, or all its senders dropping, interrupts the current pause
    /// and ends the thread after a final `TradeEvent::Shutdown`.
    pub fn start(self, stop_rx: Receiver<()>) -> Receiver<TradeEvent> {
        let (event_tx, event_rx) = unbounded::<TradeEvent>();

        thread::spawn(move || {
            let mut rng = rand::rng();
            info!(
                "Trade generator started (Thread ID: {:?})",
                thread::current().id()
            );

            loop {
                let trade = generate_mock_transaction(&mut rng, &self.exchanges);
                if event_tx.send(TradeEvent::Trade(trade)).is_err() {
                    debug!("Trade consumer gone, generator exiting");
                    return;
                }

                let pause = Duration::from_secs(rng.random_range(self.delay_secs.clone()));
                match stop_rx.recv_timeout(pause) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            let _ = event_tx.send(TradeEvent::Shutdown);
            info!("Trade generator stopped");
        });
        event_rx
    }
}
