//! Domain models of the trade generator.
//!
//! - `mock` - synthetic `Trade` values.
//! - `trade_generator` - background thread that emits trades at random intervals.

pub mod mock;
pub mod trade_generator;
