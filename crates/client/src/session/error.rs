//! Session error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Developer login was requested but the backend does not advertise it.
    #[error("developer login is disabled")]
    DevLoginDisabled,

    /// The backend rejected or the transport failed the request.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Durable storage failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether the failure is recoverable by simply retrying (nothing was
    /// authoritatively rejected).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_transient())
    }
}
