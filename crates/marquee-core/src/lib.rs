//! # marquee-core: Domain Types for the Review Mirror
//!
//! This crate holds every type the sync engine and the presentation layer
//! agree on, as plain data with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Marquee Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (passive listeners)                │   │
//! │  │    Reviews list ── Search results ── Catalog ── Gatekeeper      │   │
//! │  └─────────────────────────────▲───────────────────────────────────┘   │
//! │                                │ events                                 │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                 marquee-sync (SyncEngine)                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ marquee-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │  Review   │  │ CatalogId │  │ Category  │  │validation │   │   │
//! │  │   │  Rating   │  │  cata_<id>│  │Gatekeeper │  │  rules    │   │   │
//! │  │   │  Search   │  │ PubInfo   │  │   Item    │  │           │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Review, SearchResult, CatalogId, GatekeeperItem, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules applied before any remote call
//!
//! ## Example Usage
//!
//! ```rust
//! use marquee_core::{CatalogId, SearchResult};
//!
//! // Catalog identifiers are a reversible prefix over review ids
//! let cid = CatalogId::from_review_id("tt0111161");
//! assert_eq!(cid.to_string(), "cata_tt0111161");
//! assert_eq!(CatalogId::parse("cata_tt0111161").review_id(), "tt0111161");
//!
//! // Search matching is a case-insensitive substring test
//! let hit = SearchResult::new("tt0111161", "The Shawshank Redemption");
//! assert!(hit.matches_query("shawshank"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix that turns a review id into a catalog id.
pub const CATALOG_ID_PREFIX: &str = "cata_";

/// Highest rating a review may carry.
pub const MAX_RATING: u8 = 5;

/// Maximum length of any identifier or domain.
///
/// ## Why a limit?
/// Identifiers and domains become URL path segments on the remote side.
pub const MAX_IDENTIFIER_LEN: usize = 128;
