//! # Domain Types
//!
//! Core domain types mirrored from the remote side.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Review      │   │  SearchResult   │   │   CatalogId     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  "cata_" + id   │       │
//! │  │  title          │   │  title          │   │  (reversible)   │       │
//! │  │  rating (0..=5) │   └─────────────────┘   └─────────────────┘       │
//! │  │  comment        │                                                    │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ GatekeeperItem  │   │    Category     │   │ PublicationInfo │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  Pending        │   │  file_id        │       │
//! │  │  domain         │   │  Approved       │   │  delegations    │       │
//! │  └─────────────────┘   │  Rejected       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers stay plain `String`s: the remote side owns their format.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::{CATALOG_ID_PREFIX, MAX_RATING};

// =============================================================================
// Rating
// =============================================================================

/// A review rating in `0..=MAX_RATING`.
///
/// ## Wire Format
/// Form submissions deliver the rating as a string (`"4"`), stored reviews
/// deliver it as a number. Both decode to the same value; encoding always
/// produces a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, TS)]
#[ts(export)]
pub struct Rating(u8);

impl Rating {
    /// Creates a rating, rejecting values above [`MAX_RATING`].
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > MAX_RATING {
            return Err(ValidationError::OutOfRange {
                field: "rating".to_string(),
                min: 0,
                max: MAX_RATING as i64,
            });
        }
        Ok(Rating(value))
    }

    /// Returns the raw value.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RatingVisitor;

        impl<'de> Visitor<'de> for RatingVisitor {
            type Value = Rating;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a rating between 0 and {} as a number or string", MAX_RATING)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rating, E> {
                let v = u8::try_from(v).map_err(|_| E::custom(format!("rating {} out of range", v)))?;
                Rating::new(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rating, E> {
                let v = u64::try_from(v).map_err(|_| E::custom(format!("rating {} out of range", v)))?;
                self.visit_u64(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Rating, E> {
                let v: u64 = v
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("rating '{}' is not a number", v)))?;
                self.visit_u64(v)
            }
        }

        deserializer.deserialize_any(RatingVisitor)
    }
}

// =============================================================================
// Review
// =============================================================================

/// A movie review, unique by `id` within the local review collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Review {
    /// Movie identifier (assigned by the search backend).
    pub id: String,

    /// Movie title as returned by search.
    pub title: String,

    /// Rating given by the reviewer.
    pub rating: Rating,

    /// Free-form comment.
    #[serde(default)]
    pub comment: String,
}

impl Review {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Self {
        Review {
            id: id.into(),
            title: title.into(),
            rating,
            comment: comment.into(),
        }
    }

    /// Returns the `{id, title}` pair used by search results.
    pub fn summary(&self) -> SearchResult {
        SearchResult::new(self.id.clone(), self.title.clone())
    }
}

// =============================================================================
// Search Result
// =============================================================================

/// A movie returned by title search that has not been reviewed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        SearchResult {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Case-insensitive substring match of the title against a query.
    ///
    /// An empty title or an empty query never matches.
    pub fn matches_query(&self, query: &str) -> bool {
        !self.title.is_empty()
            && !query.is_empty()
            && self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

// =============================================================================
// Catalog Identifier
// =============================================================================

/// Catalog identifier: a review id behind the `cata_` prefix.
///
/// ## Transform
/// ```text
///   review id  ──to──►  "cata_" + id  ──parse──►  review id
/// ```
/// Parsing is lenient: a string without a leading prefix is taken as a
/// bare review id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
#[ts(export)]
pub struct CatalogId(String);

impl CatalogId {
    /// Wraps a review id.
    pub fn from_review_id(id: impl Into<String>) -> Self {
        CatalogId(id.into())
    }

    /// Parses either `cata_<id>` or a bare `<id>`.
    pub fn parse(s: &str) -> Self {
        CatalogId(s.strip_prefix(CATALOG_ID_PREFIX).unwrap_or(s).to_string())
    }

    /// Returns the underlying review id.
    pub fn review_id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CATALOG_ID_PREFIX, self.0)
    }
}

impl Serialize for CatalogId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CatalogId::parse(&s))
    }
}

// =============================================================================
// Catalog Publication Data
// =============================================================================

/// Publication state of a review in the shared catalog.
///
/// An entry with neither a file nor delegations has not been published yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PublicationInfo {
    /// Identifier of the uploaded file.
    #[serde(default)]
    pub file_id: Option<String>,

    /// Users the review has been delegated to.
    #[serde(default)]
    pub delegations: Vec<String>,
}

impl PublicationInfo {
    pub fn is_unpublished(&self) -> bool {
        self.file_id.is_none() && self.delegations.is_empty()
    }
}

/// Publication metadata read for a review before upload.
///
/// Only `file_id` is interpreted; everything else is forwarded untouched
/// to the upload call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewMeta {
    pub file_id: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A delegation or revocation of one user's access to a published review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccessGrant {
    /// Catalog entry the grant applies to.
    pub catalog_id: CatalogId,

    /// Uploaded file backing the entry.
    pub file_id: String,

    /// User receiving or losing access.
    pub user_id: String,
}

// =============================================================================
// Gatekeeper
// =============================================================================

/// Partition of gatekeeper access-decision items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pending,
    Approved,
    Rejected,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 3] = [Category::Pending, Category::Approved, Category::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pending => "pending",
            Category::Approved => "approved",
            Category::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "pending" => Ok(Category::Pending),
            "approved" => Ok(Category::Approved),
            "rejected" => Ok(Category::Rejected),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

/// An `(id, domain)` pair held in one gatekeeper category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GatekeeperItem {
    pub id: String,
    pub domain: String,
}

impl GatekeeperItem {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        GatekeeperItem {
            id: id.into(),
            domain: domain.into(),
        }
    }

    /// Structural equality against a bare pair.
    pub fn matches(&self, id: &str, domain: &str) -> bool {
        self.id == id && self.domain == domain
    }

    /// Places this item in a category.
    pub fn in_category(self, category: Category) -> AccessEntry {
        AccessEntry {
            category,
            id: self.id,
            domain: self.domain,
        }
    }
}

/// A fully-qualified gatekeeper entry: `category / id / domain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccessEntry {
    pub category: Category,
    pub id: String,
    pub domain: String,
}

impl AccessEntry {
    pub fn new(category: Category, id: impl Into<String>, domain: impl Into<String>) -> Self {
        AccessEntry {
            category,
            id: id.into(),
            domain: domain.into(),
        }
    }

    /// Remote path of this entry, e.g. `pending/u1/example.com`.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.category, self.id, self.domain)
    }

    /// Drops the category.
    pub fn item(&self) -> GatekeeperItem {
        GatekeeperItem::new(self.id.clone(), self.domain.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
