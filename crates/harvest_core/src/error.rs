//! Error types for the core library

use thiserror::Error;

/// The core error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Plugin is not part of the active load order
    #[error("Plugin not loaded: {0}")]
    UnknownPlugin(String),
    /// Text could not be read as a FormID
    #[error("Invalid FormID: {0}")]
    InvalidFormId(String),
    /// Record signature is not one we understand
    #[error("Unknown record signature: {0}")]
    UnknownSignature(String),
    /// No more plugin slots of the requested kind
    #[error("Load order is full, cannot add {0}")]
    LoadOrderFull(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
