//! Persistence errors.

use std::path::PathBuf;

use crate::classification::ConfigError;

/// Errors raised while saving or loading stages.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload encoding error: {0}")]
    Payload(#[from] postcard::Error),

    #[error("{component} {uid} of type {type_name} does not support persistence")]
    Unsupported {
        component: String,
        uid: String,
        type_name: &'static str,
    },

    #[error("expected class {expected}, found {found}")]
    ClassMismatch { expected: String, found: String },

    #[error("no loader registered for class {0}")]
    UnknownClass(String),

    #[error("path {0} already exists; use save_with(path, true) to overwrite")]
    PathExists(PathBuf),

    #[error("missing metadata file in {0}")]
    MissingMetadata(PathBuf),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid saved configuration: {0}")]
    Config(#[from] ConfigError),
}
