//! # Validation Module
//!
//! Input validation applied before the sync engine issues a remote call.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                  │
//! │  └── Form-level checks, immediate feedback                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: SyncEngine (Rust)                                             │
//! │  ├── Type validation (deserialization)                                  │
//! │  └── THIS MODULE: identifiers are safe path segments, lengths, ranges   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote server                                                 │
//! │  └── Authoritative checks (opaque to us)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use marquee_core::validation::{validate_identifier, validate_title};
//!
//! validate_identifier("id", "tt0111161").unwrap();
//! assert!(validate_identifier("domain", "a/b").is_err());
//! assert!(validate_title("").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Review;
use crate::MAX_IDENTIFIER_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_TITLE_LEN: usize = 300;
const MAX_COMMENT_LEN: usize = 5000;
const MAX_QUERY_LEN: usize = 200;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a value that will be used as a single URL path segment.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most [`MAX_IDENTIFIER_LEN`] characters
/// - Must not contain `/`
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    if value.contains('/') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates a gatekeeper `(id, domain)` pair.
pub fn validate_access_pair(id: &str, domain: &str) -> ValidationResult<()> {
    validate_identifier("id", id)?;
    validate_identifier("domain", domain)
}

// =============================================================================
// Review Validators
// =============================================================================

/// Validates a movie title.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(())
}

/// Validates a review comment. Empty comments are allowed.
pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LEN,
        });
    }
    Ok(())
}

/// Validates a full review before create/update.
///
/// Rating range is already enforced by [`crate::Rating`] itself.
pub fn validate_review(review: &Review) -> ValidationResult<()> {
    validate_identifier("id", &review.id)?;
    validate_title(&review.title)?;
    validate_comment(&review.comment)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "query".to_string(),
        });
    }

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
