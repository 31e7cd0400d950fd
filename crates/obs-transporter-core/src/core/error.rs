//! OBS Scene Transporter Error Definitions
//!
//! Defines error types used throughout the project.

use std::path::PathBuf;

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Collection Errors
    // =========================================================================
    #[error("Scene collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Archive {archive} does not contain {member}")]
    DocumentMissing { archive: PathBuf, member: String },

    #[error("Scene collection document in {source_name} is malformed: {reason}")]
    DocumentMalformed { source_name: String, reason: String },

    #[error("Invalid scene collection: {0}")]
    InvalidDocument(String),

    // =========================================================================
    // Environment Errors
    // =========================================================================
    #[error("Cannot determine {0} directory for this user")]
    DirectoryUnavailable(&'static str),

    #[error("Settings error: {0}")]
    Settings(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Builds a [`CoreError::DocumentMalformed`] for a document read from `source_name`.
    pub fn malformed(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DocumentMalformed {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}
