//! # Sync Engine
//!
//! Owns every locally cached collection and keeps it consistent with the
//! remote side.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SyncEngine Architecture                         │
//! │                                                                         │
//! │   caller (user action / timer)                                          │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          SyncEngine                              │  │
//! │  │                                                                  │  │
//! │  │  reviews.rs     create / update / remove / read / list / search  │  │
//! │  │  catalog.rs     reconcile / init / upload / delegate / revoke    │  │
//! │  │  gatekeeper.rs  populate (two-level fan-out) / approve / reject  │  │
//! │  │                                                                  │  │
//! │  │  ┌────────────────────────────────────────────────────────────┐  │  │
//! │  │  │ EngineState (std Mutex, never held across .await)          │  │  │
//! │  │  │ reviews · search · last_search · catalog · gatekeeper ·    │  │  │
//! │  │  │ users                                                      │  │  │
//! │  │  └────────────────────────────────────────────────────────────┘  │  │
//! │  └───────────────┬──────────────────────────────────┬───────────────┘  │
//! │                  │ await                            │ notify           │
//! │                  ▼                                  ▼                  │
//! │        Arc<dyn RemoteStore>          EventBus × 4 (reviews, search,    │
//! │                                      catalog, gatekeeper)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write-Through
//! Local state changes only inside the completion of a successful remote
//! call. A failed call leaves state untouched, is logged with `warn!` and
//! is returned to the caller. Nothing is retried.
//!
//! Listeners are notified after the state lock is released, so a listener
//! may call back into the engine's accessors.

mod catalog;
mod gatekeeper;
mod reviews;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{BootstrapReport, CatalogDelta};

use std::sync::{Arc, Mutex};

use marquee_core::{CatalogId, Category, GatekeeperItem, Review, SearchResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bus::{EventBus, EventSource, Stream};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::{CatalogEvent, GatekeeperEvent, ReviewEvent, SearchEvent};
use crate::remote::RemoteStore;
use crate::transport::HttpRemoteStore;

// =============================================================================
// Engine State
// =============================================================================

/// Items per gatekeeper category.
#[derive(Debug, Default, Clone)]
pub(crate) struct GatekeeperState {
    pending: Vec<GatekeeperItem>,
    approved: Vec<GatekeeperItem>,
    rejected: Vec<GatekeeperItem>,
}

impl GatekeeperState {
    pub(crate) fn items(&self, category: Category) -> &Vec<GatekeeperItem> {
        match category {
            Category::Pending => &self.pending,
            Category::Approved => &self.approved,
            Category::Rejected => &self.rejected,
        }
    }

    pub(crate) fn items_mut(&mut self, category: Category) -> &mut Vec<GatekeeperItem> {
        match category {
            Category::Pending => &mut self.pending,
            Category::Approved => &mut self.approved,
            Category::Rejected => &mut self.rejected,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct EngineState {
    reviews: Vec<Review>,
    search: Vec<SearchResult>,
    last_search: String,
    catalog: Vec<CatalogId>,
    gatekeeper: GatekeeperState,
    users: Vec<String>,
}

impl EngineState {
    fn is_reviewed(&self, id: &str) -> bool {
        self.reviews.iter().any(|r| r.id == id)
    }

    fn find_review(&self, id: &str) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    /// Replaces the review with the same id, or appends it.
    fn upsert_review(&mut self, review: Review) {
        match self.reviews.iter_mut().find(|r| r.id == review.id) {
            Some(existing) => *existing = review,
            None => self.reviews.push(review),
        }
    }

    fn remove_review(&mut self, id: &str) -> Option<Review> {
        let inx = self.reviews.iter().position(|r| r.id == id)?;
        Some(self.reviews.remove(inx))
    }

    /// Drops a reviewed id from the search results.
    fn take_search_hit(&mut self, id: &str) -> Option<SearchResult> {
        let inx = self.search.iter().position(|s| s.id == id)?;
        Some(self.search.remove(inx))
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

pub struct SyncEngine {
    /// Instance id, carried by every notification.
    id: Uuid,

    config: SyncConfig,

    remote: Arc<dyn RemoteStore>,

    state: Mutex<EngineState>,

    /// Held across a whole listing + reconcile when
    /// `catalog.serialize_reconcile` is set.
    reconcile_gate: tokio::sync::Mutex<()>,

    review_bus: EventBus<ReviewEvent>,
    search_bus: EventBus<SearchEvent>,
    catalog_bus: EventBus<CatalogEvent>,
    gatekeeper_bus: EventBus<GatekeeperEvent>,
}

impl SyncEngine {
    /// Creates an engine over the given remote store.
    pub fn new(config: SyncConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let id = Uuid::new_v4();
        let source = |stream| EventSource {
            engine_id: id,
            stream,
        };

        info!(
            engine = %id,
            clear_strategy = %config.gatekeeper.clear_strategy,
            decision_append = %config.gatekeeper.decision_append,
            serialize_reconcile = config.catalog.serialize_reconcile,
            "Sync engine created"
        );

        SyncEngine {
            id,
            config,
            remote,
            state: Mutex::new(EngineState::default()),
            reconcile_gate: tokio::sync::Mutex::new(()),
            review_bus: EventBus::new(source(Stream::Reviews)),
            search_bus: EventBus::new(source(Stream::Search)),
            catalog_bus: EventBus::new(source(Stream::Catalog)),
            gatekeeper_bus: EventBus::new(source(Stream::Gatekeeper)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // =========================================================================
    // Event Streams
    // =========================================================================

    pub fn review_events(&self) -> &EventBus<ReviewEvent> {
        &self.review_bus
    }

    pub fn search_events(&self) -> &EventBus<SearchEvent> {
        &self.search_bus
    }

    pub fn catalog_events(&self) -> &EventBus<CatalogEvent> {
        &self.catalog_bus
    }

    pub fn gatekeeper_events(&self) -> &EventBus<GatekeeperEvent> {
        &self.gatekeeper_bus
    }

    // =========================================================================
    // Read Accessors
    // =========================================================================

    pub fn count_review(&self) -> usize {
        self.with_state(|s| s.reviews.len())
    }

    pub fn count_search(&self) -> usize {
        self.with_state(|s| s.search.len())
    }

    pub fn is_reviewed(&self, id: &str) -> bool {
        self.with_state(|s| s.is_reviewed(id))
    }

    pub fn users(&self) -> Vec<String> {
        self.with_state(|s| s.users.clone())
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.with_state(|s| s.reviews.clone())
    }

    pub fn review(&self, id: &str) -> Option<Review> {
        self.with_state(|s| s.find_review(id).cloned())
    }

    pub fn search_results(&self) -> Vec<SearchResult> {
        self.with_state(|s| s.search.clone())
    }

    pub fn last_search(&self) -> String {
        self.with_state(|s| s.last_search.clone())
    }

    pub fn catalog_mirror(&self) -> Vec<CatalogId> {
        self.with_state(|s| s.catalog.clone())
    }

    pub fn gatekeeper(&self, category: Category) -> Vec<GatekeeperItem> {
        self.with_state(|s| s.gatekeeper.items(category).clone())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Runs a short synchronous block against the state.
    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let mut state = self.state.lock().expect("Engine state mutex poisoned");
        f(&mut state)
    }

    /// Logs a failed remote operation and hands the error back.
    fn remote_failed(&self, operation: &'static str, err: SyncError) -> SyncError {
        warn!(
            engine = %self.id,
            operation,
            status = ?err.status(),
            error = %err,
            "Remote operation failed"
        );
        err
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a SyncEngine with options.
pub struct SyncEngineBuilder {
    config: SyncConfig,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl SyncEngineBuilder {
    pub fn new(config: SyncConfig) -> Self {
        SyncEngineBuilder {
            config,
            remote: None,
        }
    }

    /// Sets the remote store. Defaults to HTTP against `config.remote`.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn build(self) -> SyncResult<SyncEngine> {
        self.config.validate()?;

        let remote = match self.remote {
            Some(remote) => remote,
            None => Arc::new(HttpRemoteStore::new(&self.config.remote)?),
        };

        Ok(SyncEngine::new(self.config, remote))
    }
}
