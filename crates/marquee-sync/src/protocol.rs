//! # Remote Route Table
//!
//! Maps every remote operation to a method, a URL and the status that
//! counts as success.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Remote Routes                                   │
//! │                                                                         │
//! │  REVIEW SERVICE ({review})                                             │
//! │  POST {review}/create/{id}        body: Review                         │
//! │  POST {review}/update/{id}        body: Review                         │
//! │  POST {review}/delete/{id}        body: {}                             │
//! │  GET  {review}/read/{id}          → Review                             │
//! │  GET  {review}/list               → [id]                               │
//! │                                                                         │
//! │  SEARCH SERVICE ({search})                                             │
//! │  GET  {search}/title/{title}      → [{id, title}]                      │
//! │                                                                         │
//! │  CATALOG SERVICE ({catalog})                                           │
//! │  POST {catalog}/review/read/list  → [cata_id]                          │
//! │  GET  {catalog}/review/read/list  → {id: {file_id, delegations}}       │
//! │  GET  {catalog}/users             → [user]                             │
//! │  GET  {catalog}/review/read/meta/{id} → {file_id, ...}                 │
//! │  POST {catalog}/review/upload     body: meta                           │
//! │  POST {catalog}/review/delegate   body: {file_id, user_id}             │
//! │  POST {catalog}/review/revoke     body: {file_id, user_id}             │
//! │                                                                         │
//! │  GATEKEEPER SERVICE ({gatekeeper})                                     │
//! │  POST {gatekeeper}/op/list/{category}[/{id}]  → [id] | [domain]        │
//! │  POST {gatekeeper}/op/approve/{id}/{domain}                            │
//! │  POST {gatekeeper}/op/reject/{id}/{domain}                             │
//! │  POST {gatekeeper}/op/remove/{category}/{id}/{domain}                  │
//! │                                                                         │
//! │  Every route succeeds with 200; anything else is a failure.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dynamic segments are percent-encoded individually, so a title such as
//! `Blade Runner` becomes `Blade%20Runner`.

use std::fmt;

use marquee_core::{AccessEntry, Category, GatekeeperItem};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RemoteSettings;
use crate::error::{SyncError, SyncResult};

/// Status every route expects on success.
pub const STATUS_OK: u16 = 200;

// =============================================================================
// Route
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A fully resolved remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub url: Url,
    pub expected_status: u16,
}

impl Route {
    /// Path component of the URL, percent-encoded.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn accepts(&self, status: u16) -> bool {
        status == self.expected_status
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url.path())
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of delegate and revoke requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationBody {
    pub file_id: String,
    pub user_id: String,
}

// =============================================================================
// Route Table
// =============================================================================

/// Resolves operations to routes against the configured services.
#[derive(Debug, Clone)]
pub struct Routes {
    base: Url,
    search: Url,
    review: Vec<String>,
    catalog: Vec<String>,
    gatekeeper: Vec<String>,
}

fn split_mount(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn ensure_base(url: Url) -> SyncResult<Url> {
    if url.cannot_be_a_base() {
        return Err(SyncError::InvalidUrl(format!("cannot be a base URL: {}", url)));
    }
    Ok(url)
}

impl Routes {
    pub fn new(settings: &RemoteSettings) -> SyncResult<Self> {
        Ok(Routes {
            base: ensure_base(settings.base()?)?,
            search: ensure_base(settings.search_base()?)?,
            review: split_mount(&settings.review_path),
            catalog: split_mount(&settings.catalog_path),
            gatekeeper: split_mount(&settings.gatekeeper_path),
        })
    }

    fn resolve(&self, method: Method, root: &Url, mount: &[String], segments: &[&str]) -> Route {
        let mut url = root.clone();
        // Both roots were checked in `new`, so the segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(mount);
            path.extend(segments);
        }
        Route {
            method,
            url,
            expected_status: STATUS_OK,
        }
    }

    // =========================================================================
    // Review Service
    // =========================================================================

    pub fn create_review(&self, id: &str) -> Route {
        self.resolve(Method::Post, &self.base, &self.review, &["create", id])
    }

    pub fn update_review(&self, id: &str) -> Route {
        self.resolve(Method::Post, &self.base, &self.review, &["update", id])
    }

    pub fn delete_review(&self, id: &str) -> Route {
        self.resolve(Method::Post, &self.base, &self.review, &["delete", id])
    }

    pub fn read_review(&self, id: &str) -> Route {
        self.resolve(Method::Get, &self.base, &self.review, &["read", id])
    }

    pub fn list_reviews(&self) -> Route {
        self.resolve(Method::Get, &self.base, &self.review, &["list"])
    }

    // =========================================================================
    // Search Service
    // =========================================================================

    pub fn search_titles(&self, title: &str) -> Route {
        self.resolve(Method::Get, &self.search, &[], &["title", title])
    }

    // =========================================================================
    // Catalog Service
    // =========================================================================

    pub fn sync_catalog_ids(&self) -> Route {
        self.resolve(Method::Post, &self.base, &self.catalog, &["review", "read", "list"])
    }

    pub fn list_catalog(&self) -> Route {
        self.resolve(Method::Get, &self.base, &self.catalog, &["review", "read", "list"])
    }

    pub fn list_users(&self) -> Route {
        self.resolve(Method::Get, &self.base, &self.catalog, &["users"])
    }

    pub fn read_review_meta(&self, id: &str) -> Route {
        self.resolve(Method::Get, &self.base, &self.catalog, &["review", "read", "meta", id])
    }

    pub fn upload_review(&self) -> Route {
        self.resolve(Method::Post, &self.base, &self.catalog, &["review", "upload"])
    }

    pub fn delegate(&self) -> Route {
        self.resolve(Method::Post, &self.base, &self.catalog, &["review", "delegate"])
    }

    pub fn revoke(&self) -> Route {
        self.resolve(Method::Post, &self.base, &self.catalog, &["review", "revoke"])
    }

    // =========================================================================
    // Gatekeeper Service
    // =========================================================================

    pub fn list_gatekeeper_ids(&self, category: Category) -> Route {
        self.resolve(
            Method::Post,
            &self.base,
            &self.gatekeeper,
            &["op", "list", category.as_str()],
        )
    }

    pub fn list_gatekeeper_domains(&self, category: Category, id: &str) -> Route {
        self.resolve(
            Method::Post,
            &self.base,
            &self.gatekeeper,
            &["op", "list", category.as_str(), id],
        )
    }

    pub fn approve_access(&self, item: &GatekeeperItem) -> Route {
        self.resolve(
            Method::Post,
            &self.base,
            &self.gatekeeper,
            &["op", "approve", item.id.as_str(), item.domain.as_str()],
        )
    }

    pub fn reject_access(&self, item: &GatekeeperItem) -> Route {
        self.resolve(
            Method::Post,
            &self.base,
            &self.gatekeeper,
            &["op", "reject", item.id.as_str(), item.domain.as_str()],
        )
    }

    pub fn remove_access_entry(&self, entry: &AccessEntry) -> Route {
        self.resolve(
            Method::Post,
            &self.base,
            &self.gatekeeper,
            &["op", "remove", entry.category.as_str(), entry.id.as_str(), entry.domain.as_str()],
        )
    }
}
