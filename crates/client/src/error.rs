//! Unified error handling.
//!
//! Provides a unified `ClientError` type aggregating the per-module errors,
//! so an embedding shell (the CLI, a UI layer) can handle everything the
//! library produces behind one `Result`.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::store::StoreError;

/// Top-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog API operation failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The operation requires a logged-in user.
    #[error("Not logged in")]
    NotAuthenticated,
}

impl ClientError {
    /// Whether this error is an authorization rejection that must trigger
    /// the session manager's forced logout, wherever it surfaced.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        match self {
            Self::Api(e) | Self::Session(SessionError::Api(e)) | Self::Checkout(CheckoutError::Api(e)) => {
                e.is_auth_rejection()
            }
            _ => false,
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_rejection_detected_through_wrappers() {
        let err = ClientError::Api(ApiError::Unauthorized("expired".to_string()));
        assert!(err.is_auth_rejection());

        let err = ClientError::Checkout(CheckoutError::Api(ApiError::Unauthorized(
            "expired".to_string(),
        )));
        assert!(err.is_auth_rejection());

        let err = ClientError::Checkout(CheckoutError::EmptyCart);
        assert!(!err.is_auth_rejection());
    }

    #[test]
    fn test_display() {
        let err = ClientError::NotAuthenticated;
        assert_eq!(err.to_string(), "Not logged in");
    }
}
