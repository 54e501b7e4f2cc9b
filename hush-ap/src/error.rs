//! Error types for hush-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Engine commands never return these to their callers; failures are turned into
//! events and outcomes at the engine boundary.

use hush_common::Category;
use thiserror::Error;

/// Main error type for hush-ap module
#[derive(Error, Debug)]
pub enum Error {
    /// Asset for a category is missing or cannot be decoded
    #[error("Source unavailable for {category}: {reason}")]
    SourceUnavailable { category: Category, reason: String },

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from hush-common
    #[error(transparent)]
    Common(#[from] hush_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap any failure while opening a category's asset
    pub fn source_unavailable(category: Category, reason: impl std::fmt::Display) -> Self {
        Error::SourceUnavailable {
            category,
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type using hush-ap Error
pub type Result<T> = std::result::Result<T, Error>;
