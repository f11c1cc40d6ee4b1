//! Error types for the engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the ingestion and query engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backing store error.
    #[error("store error: {0}")]
    Store(#[from] wordvault_store::StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configured source container does not exist.
    #[error("source not found: {path}")]
    SourceMissing {
        /// The missing source path.
        path: PathBuf,
    },

    /// The source container holds no readable content.
    #[error("source is empty: {path}")]
    SourceEmpty {
        /// The empty source path.
        path: PathBuf,
    },

    /// Configuration is incomplete or inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Stored metadata could not be decoded.
    #[error("invalid metadata: {message}")]
    InvalidMeta {
        /// Description of the problem.
        message: String,
    },

    /// Ingestion finished but the store ended up with no words.
    ///
    /// Fatal and never retried: it means either the source held no
    /// usable lines or every line was filtered out.
    #[error("population completed but no words stored")]
    EmptyPopulation,

    /// The store facade is closed.
    #[error("word store is closed")]
    Closed,
}

impl CoreError {
    /// Creates a missing-source error.
    pub fn source_missing(path: impl Into<PathBuf>) -> Self {
        Self::SourceMissing { path: path.into() }
    }

    /// Creates an empty-source error.
    pub fn source_empty(path: impl Into<PathBuf>) -> Self {
        Self::SourceEmpty { path: path.into() }
    }

    /// Creates an invalid-configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid-metadata error.
    pub fn invalid_meta(message: impl Into<String>) -> Self {
        Self::InvalidMeta {
            message: message.into(),
        }
    }
}
