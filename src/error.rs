//! Error types for wpblocks.
//!
//! Only configuration-level problems surface as errors. Fragments that cannot
//! be classified or built are recovered locally and reported as diagnostics.

use std::io;
use thiserror::Error;

/// Result type alias for wpblocks operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wpblocks.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading or writing configuration and tables.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A cleaning rule references an action that does not exist.
    #[error("Unknown cleaning action '{name}' for rule '{prefix}'")]
    UnknownAction { prefix: String, name: String },

    /// A cleaning action reference could not be parsed.
    #[error("Invalid cleaning action '{0}'")]
    InvalidAction(String),

    /// A signature table entry (or the fallback) names an unregistered builder.
    #[error("Unknown block builder '{name}' for signature '{signature}'")]
    UnknownBuilder { signature: String, name: String },

    /// The configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
