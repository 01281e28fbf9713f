//! Error types for playbook selection.

use database::DatabaseError;
use thiserror::Error;

/// Errors from the external semantic index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// HTTP transport error (connection, timeout, etc.)
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The index service returned a non-success status.
    #[error("index error {status}: {message}")]
    Api { status: u16, message: String },

    /// No index URL configured.
    #[error("semantic index URL is not configured")]
    MissingUrl,
}

/// Errors that can occur during playbook selection.
///
/// Index unavailability is NOT represented here: the selector fails
/// open and returns "no suitable playbook" instead. Only failures of
/// Parla's own store propagate.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// The local store failed while resolving candidate steps.
    #[error("persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}
