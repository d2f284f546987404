//! # Remote Store
//!
//! The capability the engine consumes: one async method per remote
//! operation. A method returns `Ok` only when the remote answered with
//! the status expected for the route; any other outcome is an error.
//!
//! ```text
//! ┌──────────────┐        ┌──────────────────┐        ┌──────────────────┐
//! │  SyncEngine  │──────► │ dyn RemoteStore  │──────► │ HttpRemoteStore  │ (production)
//! │              │        │                  │        ├──────────────────┤
//! │              │        │                  │──────► │ ScriptedRemote   │ (tests)
//! └──────────────┘        └──────────────────┘        └──────────────────┘
//! ```

use async_trait::async_trait;
use marquee_core::{AccessEntry, CatalogId, Category, GatekeeperItem, PublicationInfo, Review, ReviewMeta, SearchResult};

use crate::error::SyncResult;

/// One entry of the catalog listing with its publication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub catalog_id: CatalogId,
    pub info: PublicationInfo,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    // =========================================================================
    // Reviews
    // =========================================================================

    async fn create_review(&self, review: &Review) -> SyncResult<()>;

    async fn update_review(&self, review: &Review) -> SyncResult<()>;

    async fn delete_review(&self, id: &str) -> SyncResult<()>;

    async fn read_review(&self, id: &str) -> SyncResult<Review>;

    /// Ids of every stored review.
    async fn list_reviews(&self) -> SyncResult<Vec<String>>;

    // =========================================================================
    // Search
    // =========================================================================

    async fn search_titles(&self, title: &str) -> SyncResult<Vec<SearchResult>>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Authoritative catalog listing used by reconciliation.
    async fn sync_catalog_ids(&self) -> SyncResult<Vec<CatalogId>>;

    /// Catalog listing with publication state.
    async fn list_catalog(&self) -> SyncResult<Vec<CatalogEntry>>;

    async fn read_review_meta(&self, review_id: &str) -> SyncResult<ReviewMeta>;

    async fn upload_review(&self, meta: &ReviewMeta) -> SyncResult<()>;

    async fn delegate(&self, file_id: &str, user_id: &str) -> SyncResult<()>;

    async fn revoke(&self, file_id: &str, user_id: &str) -> SyncResult<()>;

    async fn list_users(&self) -> SyncResult<Vec<String>>;

    // =========================================================================
    // Gatekeeper
    // =========================================================================

    /// Stage 1: ids under a category.
    async fn list_gatekeeper_ids(&self, category: Category) -> SyncResult<Vec<String>>;

    /// Stage 2: domains under `(category, id)`.
    async fn list_gatekeeper_domains(&self, category: Category, id: &str) -> SyncResult<Vec<String>>;

    async fn approve_access(&self, item: &GatekeeperItem) -> SyncResult<()>;

    async fn reject_access(&self, item: &GatekeeperItem) -> SyncResult<()>;

    async fn remove_access_entry(&self, entry: &AccessEntry) -> SyncResult<()>;
}
