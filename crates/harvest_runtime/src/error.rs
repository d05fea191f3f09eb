//! Runtime errors

use std::path::PathBuf;

use harvest_collections::CollectionError;
use harvest_data::DataError;
use harvest_gamestate::RecordError;
use thiserror::Error;

/// Errors surfaced by the runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Settings file could not be read or parsed
    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    /// Collections failed to load
    #[error(transparent)]
    Collections(#[from] CollectionError),
    /// Taxonomy configuration failed to load
    #[error(transparent)]
    Data(#[from] DataError),
    /// Save records could not be written or read
    #[error(transparent)]
    Records(#[from] RecordError),
    /// Search worker could not be started
    #[error("Search worker: {0}")]
    Worker(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias
pub type RuntimeResult<T> = Result<T, RuntimeError>;
