//! Error types
//!
//! [`RemoteError`] covers every failure of the remote store boundary (the
//! network error class). [`SyncError`] is returned by the synchronization
//! core's operations and wraps remote failures alongside validation and
//! state errors.

use thiserror::Error;

use crate::models::{LocalToken, ServerId};

/// Failure reported by a remote store
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Request could not be sent or no response arrived
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Invalid response body: {0}")]
    Decode(#[source] reqwest::Error),

    /// Store refused the operation (unknown id, injected failure, ...)
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// HTTP status code, when the failure came from the server
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors returned by synchronization core operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Title was blank after trimming; no request is issued
    #[error("Title should not be empty")]
    EmptyTitle,

    /// An add is already being submitted
    #[error("Another todo is still being added")]
    AddInFlight,

    /// Target task has not been confirmed by the server yet
    #[error("Todo {0} is still being created")]
    NotConfirmed(LocalToken),

    /// A delete for this task is already in flight
    #[error("Todo {0} is already being deleted")]
    DeleteInFlight(ServerId),

    /// No pending add carries this token
    #[error("No pending todo for {0}")]
    UnknownToken(LocalToken),

    /// No open clear batch with this id
    #[error("No clear batch #{0}")]
    UnknownBatch(u64),

    /// Remote store failed
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// Whether this error was raised before any request was issued
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::EmptyTitle)
    }

    /// Whether this error came from the remote store
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::Remote(_))
    }
}

/// Result type for core operations
pub type SyncResult<T> = Result<T, SyncError>;
