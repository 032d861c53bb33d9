//! Result type alias shared across the workspace.
//!
//! Functions return `Result<T>` and get `PipelineError` as the error type.
use crate::error::PipelineError;

/// Workspace-wide `Result` alias with `PipelineError` as the default error.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
