//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Remote      │  │      Validation         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │ UnexpectedStatus│  │  Validation             │ │
//! │  │  InvalidUrl     │  │ RequestFailed   │  │  (input rejected before │ │
//! │  │  ConfigLoad/Save│  │ DecodeFailed    │  │   any remote call)      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never retries. [`SyncError::is_retryable`] is a hint for
//! callers that want their own retry policy.

use marquee_core::ValidationError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote answered with a status other than the one expected for
    /// the route.
    #[error("{route} returned status {status}: {body}")]
    UnexpectedStatus {
        route: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect, timeout, I/O).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response from {route}: {reason}")]
    DecodeFailed { route: String, reason: String },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Input rejected before any remote call was issued.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::RequestFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if a caller could reasonably retry the operation.
    ///
    /// ## Retryable Errors
    /// - Requests that never got a response
    /// - Server-side failures (5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::RequestFailed(_) => true,
            SyncError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if this error came back from the remote side.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            SyncError::UnexpectedStatus { .. }
                | SyncError::RequestFailed(_)
                | SyncError::DecodeFailed { .. }
        )
    }

    /// HTTP status of an unexpected response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::RequestFailed("connection refused".into()).is_retryable());
        assert!(SyncError::UnexpectedStatus {
            route: "GET /review/list".into(),
            status: 503,
            body: String::new(),
        }
        .is_retryable());

        assert!(!SyncError::UnexpectedStatus {
            route: "GET /review/read/x".into(),
            status: 404,
            body: String::new(),
        }
        .is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_categories() {
        let err = SyncError::DecodeFailed {
            route: "GET /catalog/users".into(),
            reason: "expected array".into(),
        };
        assert!(err.is_remote_error());
        assert!(!err.is_config_error());
        assert_eq!(err.status(), None);

        let err = SyncError::InvalidUrl("nope".into());
        assert!(err.is_config_error());
        assert!(!err.is_remote_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::UnexpectedStatus {
            route: "POST /gatekeeper/op/approve/u1/example.com".into(),
            status: 409,
            body: "conflict".into(),
        };
        assert_eq!(
            err.to_string(),
            "POST /gatekeeper/op/approve/u1/example.com returned status 409: conflict"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_validation_converts() {
        let err: SyncError = ValidationError::Required {
            field: "id".into(),
        }
        .into();
        assert!(matches!(err, SyncError::Validation(_)));
    }
}
