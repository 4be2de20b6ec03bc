//! Error types for the shardsmith library.
//!
//! This module provides structured error handling for all shardsmith
//! operations, with error types that preserve context and enable proper
//! propagation through the deduplication pipeline.

use std::io;

use thiserror::Error;

/// Main result type for shardsmith operations.
pub type Result<T> = std::result::Result<T, ShardsmithError>;

/// Comprehensive error type for all shardsmith operations.
#[derive(Error, Debug)]
pub enum ShardsmithError {
    /// I/O related errors (record files, config files, output streams)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors, raised before any record is processed
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Validation errors for configuration values and input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Malformed record errors, recovered per record
    #[error("Record error: {message}")]
    Record {
        /// Error description
        message: String,
        /// Identifier of the offending record
        record_id: Option<String>,
    },

    /// LSH and similarity detection errors
    #[error("LSH error: {message}")]
    Lsh {
        /// Error description
        message: String,
    },

    /// Pipeline coordination errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where the error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ShardsmithError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new malformed-record error
    pub fn record(message: impl Into<String>) -> Self {
        Self::Record {
            message: message.into(),
            record_id: None,
        }
    }

    /// Create a new malformed-record error with record context
    pub fn record_with_id(message: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::Record {
            message: message.into(),
            record_id: Some(record_id.into()),
        }
    }

    /// Create a new LSH error
    pub fn lsh(message: impl Into<String>) -> Self {
        Self::Lsh {
            message: message.into(),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

// Implement From traits for common error types
impl From<io::Error> for ShardsmithError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for ShardsmithError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ShardsmithError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}
