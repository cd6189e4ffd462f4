//! Error types for Parley.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation, index, and
//! serialization errors.

use thiserror::Error;

/// Unified error type for Parley.
///
/// All fallible functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation-service errors (timeout, provider failure). The only
    /// error variant surfaced to end users as a "generation unavailable"
    /// outcome; the request that produced it is never answered partially.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Document index and retrieval errors. Includes internal faults such
    /// as a malformed department tag or an embedding dimension mismatch
    /// read back from storage; these abort the request and are never
    /// rendered as a normal answer.
    #[error("Index error: {0}")]
    Index(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
