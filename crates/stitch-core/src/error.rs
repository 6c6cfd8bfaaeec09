//! Error types for stitch-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stitch-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error while reading a named file
    #[error("CSV error in '{path}': {source}")]
    CsvFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed record in the input stream (wrong column count, bad quoting)
    #[error("malformed CSV input: {0}")]
    Malformed(#[from] csv::Error),

    /// A match rule spec that could not be parsed
    #[error("invalid match rule '{0}'")]
    InvalidRule(String),

    /// Invalid transform options
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A named target column is absent from the input header
    #[error("target column '{0}' does not exist in input CSV")]
    MissingColumn(String),

    /// No input files found for a union
    #[error("no CSV files found in '{0}'")]
    NoInputFiles(PathBuf),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
