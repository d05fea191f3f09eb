//! Data crate errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading taxonomy configuration
#[derive(Debug, Error)]
pub enum DataError {
    /// File could not be read
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Exception table is not valid TOML
    #[error("Invalid exception table: {0}")]
    Exceptions(#[from] toml::de::Error),
}

/// Result type alias
pub type DataResult<T> = Result<T, DataError>;
