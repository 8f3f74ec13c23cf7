//! # Error Types
//!
//! Every fallible operation in the library returns [`Result`], whose error side is
//! [`GridPointError`]. The first four variants form the domain taxonomy (bad input,
//! missing files, unexpected file layout, unparsable timestamps); the rest wrap the
//! underlying libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting, merging or rendering point series
#[derive(Error, Debug)]
pub enum GridPointError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No file in '{}' contains '{filter}' and ends with '{extension}'", directory.display())]
    NotFound {
        directory: PathBuf,
        filter: String,
        extension: String,
    },

    #[error("Format error in '{}': {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("Cannot parse timestamp '{value}' in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("NetCDF error in '{}': {source}", path.display())]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Result type for gridpoint operations
pub type Result<T> = std::result::Result<T, GridPointError>;

impl GridPointError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        GridPointError::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn netcdf(path: impl Into<PathBuf>, source: netcdf::Error) -> Self {
        GridPointError::NetCdf {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for GridPointError {
    fn from(error: serde_json::Error) -> Self {
        GridPointError::Config(error.to_string())
    }
}

impl From<serde_yaml::Error> for GridPointError {
    fn from(error: serde_yaml::Error) -> Self {
        GridPointError::Config(error.to_string())
    }
}
