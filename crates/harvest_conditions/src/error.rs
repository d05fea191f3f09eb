//! Condition construction errors

use thiserror::Error;

/// Errors raised while building a condition from its JSON definition
#[derive(Debug, Error)]
pub enum ConditionError {
    /// Referenced plugin is not in the load order
    #[error("Plugin not loaded: {name}")]
    Plugin { name: String },
    /// Keyword editor ID matched no loaded keyword
    #[error("Keyword not found: {name}")]
    Keyword { name: String },
    /// Structurally invalid definition
    #[error("Invalid condition: {0}")]
    Parse(String),
    /// Malformed JSON text
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type ConditionResult<T> = Result<T, ConditionError>;
