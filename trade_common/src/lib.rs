//!
//! Common types and utilities shared by the trade pipeline programs.
//!
//! This crate aggregates:
//! - `error` - unified error type `PipelineError` used across the workspace.
//! - `result` - handy `Result<T, PipelineError>` alias.
//! - `trade` - trade record and the enums it is built from.
//! - `attribute` - key-value store typed values and their plain JSON form.
//! - `change` - change records the key-value table emits for every write.
//! - `catalog` - file-backed table catalog (databases, tables, partitions).
//! - `defaults` - default names and locations used by the binaries.
#![warn(missing_docs)]
pub mod attribute;
pub mod catalog;
pub mod change;
pub mod defaults;
pub mod error;
pub mod result;
pub mod trade;

pub use error::PipelineError;
pub use result::Result;
pub use trade::Trade;
