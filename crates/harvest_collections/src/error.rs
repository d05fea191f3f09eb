//! Collection loading errors

use harvest_conditions::ConditionError;
use thiserror::Error;

/// Errors raised while loading collections
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Definition file does not match the schema; the whole file is rejected
    #[error("Schema violation at {path}: {reason}")]
    Schema { path: String, reason: String },
    /// A rule could not be built
    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Collection has neither a rootFilter nor a category list
    #[error("Collection {name} has no filter")]
    MissingFilter { name: String },
    #[error("Duplicate collection name: {0}")]
    DuplicateName(String),
}

impl CollectionError {
    /// Create a schema error
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type CollectionResult<T> = Result<T, CollectionError>;
