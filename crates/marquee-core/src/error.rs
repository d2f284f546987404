//! # Error Types
//!
//! Domain-specific error types for marquee-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  marquee-core errors (this file)                                       │
//! │  ├── CoreError        - Domain parsing failures                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  marquee-sync errors (separate crate)                                  │
//! │  └── SyncError        - Remote, config, and engine failures            │
//! │                                                                         │
//! │  Flow: ValidationError → SyncError → caller                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised while interpreting identifiers and categories.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A gatekeeper category name outside `pending | approved | rejected`.
    #[error("Unknown gatekeeper category: {0}")]
    UnknownCategory(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before a remote call is issued, so a rejected input never
/// reaches the server and never touches local state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., a path separator inside an identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
