//! Error types shared by the generator, the stream transformer and the batch job.
//!
//! The `PipelineError` enum unifies I/O, serialization, decoding, catalog and
//! store failures, allowing every crate to propagate a single error type.
use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Unified error type shared by all pipeline programs.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// I/O error originating from files or directories.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// UTF-8 conversion error when handling decoded payloads.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Invalid base64 payload.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A typed attribute value that cannot be converted (e.g. a non-numeric `N`).
    #[error("Invalid attribute value: {0}")]
    Attribute(String),

    /// Unknown database or table, or a malformed catalog file.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Key-value or table store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),
}
