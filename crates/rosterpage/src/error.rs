//! Error types for rosterpage.
//!
//! This module defines the error type shared by the loader, renderer, gate
//! tooling and configuration layer. Gate rejections are not errors; see
//! [`crate::gate::Rejection`].

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rosterpage operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Data Errors ===
    /// The data file could not be read.
    #[error("cannot read data file {path}: {source}")]
    DataRead {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The data file is not well-formed JSON.
    #[error("invalid JSON in data file {path}: {source}")]
    DataParse {
        /// Path to the data file.
        path: PathBuf,
        /// The parser diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// The data file is valid JSON but does not match the record schema.
    #[error("schema violation in data file {path}: {message}")]
    DataSchema {
        /// Path to the data file.
        path: PathBuf,
        /// Description of the violation.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Output Errors ===
    /// Failed to write a generated file.
    #[error("failed to write {path}: {source}")]
    OutputWrite {
        /// Path that couldn't be written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Page Errors ===
    /// Formatting the page failed.
    #[error("failed to render page: {0}")]
    Render(#[from] std::fmt::Error),

    /// A rendered page did not contain what the gate needs.
    #[error("cannot use page {path}: {message}")]
    Page {
        /// Path to the rendered page.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rosterpage operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a schema violation error for the given data file.
    #[must_use]
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DataSchema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a page error for the given rendered page.
    #[must_use]
    pub fn page(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Page {
            path: path.into(),
            message: message.into(),
        }
    }
}
