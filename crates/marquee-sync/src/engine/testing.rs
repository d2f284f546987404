//! In-memory [`RemoteStore`] and event capture used by the engine tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use marquee_core::{
    AccessEntry, CatalogId, Category, GatekeeperItem, PublicationInfo, Rating, Review, ReviewMeta,
    SearchResult,
};

use crate::bus::EventBus;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{CatalogEntry, RemoteStore};

use super::SyncEngine;

#[derive(Default)]
struct Script {
    reviews: HashMap<String, Review>,
    review_ids: Vec<String>,
    search: Vec<SearchResult>,
    catalog_ids: Vec<CatalogId>,
    catalog_responses: VecDeque<(Vec<CatalogId>, Duration)>,
    catalog: Vec<CatalogEntry>,
    metas: HashMap<String, ReviewMeta>,
    users: Vec<String>,
    gatekeeper_ids: HashMap<Category, Vec<String>>,
    gatekeeper_domains: HashMap<(Category, String), Vec<String>>,
    delays: HashMap<String, Duration>,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
}

/// Scripted remote: answers from canned data, records every call, and can
/// fail chosen operations or delay responses for chosen ids.
#[derive(Default)]
pub(crate) struct ScriptedRemote {
    script: Mutex<Script>,
}

impl ScriptedRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub(crate) fn put_review(&self, review: Review) {
        self.script().reviews.insert(review.id.clone(), review);
    }

    pub(crate) fn set_review_ids(&self, ids: &[&str]) {
        self.script().review_ids = ids.iter().map(|s| s.to_string()).collect();
    }

    pub(crate) fn set_search(&self, results: Vec<SearchResult>) {
        self.script().search = results;
    }

    pub(crate) fn set_catalog_ids(&self, ids: &[&str]) {
        self.script().catalog_ids = ids.iter().map(|s| CatalogId::parse(s)).collect();
    }

    /// Queues one catalog id listing, answered after `after`.
    ///
    /// Queued listings are handed out in call order; once the queue is
    /// empty the listing from `set_catalog_ids` is returned immediately.
    pub(crate) fn queue_catalog_ids(&self, ids: &[&str], after: Duration) {
        let ids = ids.iter().map(|s| CatalogId::parse(s)).collect();
        self.script().catalog_responses.push_back((ids, after));
    }

    pub(crate) fn set_catalog_listing(&self, entries: Vec<(&str, PublicationInfo)>) {
        self.script().catalog = entries
            .into_iter()
            .map(|(id, info)| CatalogEntry {
                catalog_id: CatalogId::parse(id),
                info,
            })
            .collect();
    }

    pub(crate) fn put_meta(&self, review_id: &str, meta: ReviewMeta) {
        self.script().metas.insert(review_id.to_string(), meta);
    }

    pub(crate) fn set_users(&self, users: &[&str]) {
        self.script().users = users.iter().map(|s| s.to_string()).collect();
    }

    /// Scripts both fan-out stages of a category.
    pub(crate) fn set_gatekeeper(&self, category: Category, listing: &[(&str, &[&str])]) {
        let mut script = self.script();
        script
            .gatekeeper_ids
            .insert(category, listing.iter().map(|(id, _)| id.to_string()).collect());
        for (id, domains) in listing {
            script.gatekeeper_domains.insert(
                (category, id.to_string()),
                domains.iter().map(|d| d.to_string()).collect(),
            );
        }
    }

    /// Delays responses that concern `id` (domain listings and review reads).
    pub(crate) fn delay(&self, id: &str, by: Duration) {
        self.script().delays.insert(id.to_string(), by);
    }

    pub(crate) fn fail(&self, operation: &'static str) {
        self.script().failing.insert(operation);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.script().calls.clone()
    }

    pub(crate) fn calls_to(&self, operation: &str) -> Vec<String> {
        let prefix = format!("{} ", operation);
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix) || c == operation)
            .collect()
    }

    /// Records the call, then fails it if the operation is scripted to fail.
    fn enter(&self, operation: &'static str, detail: impl Into<String>) -> SyncResult<()> {
        let detail = detail.into();
        let mut script = self.script();
        let call = if detail.is_empty() {
            operation.to_string()
        } else {
            format!("{} {}", operation, detail)
        };
        script.calls.push(call.clone());

        if script.failing.contains(operation) {
            return Err(SyncError::UnexpectedStatus {
                route: call,
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        Ok(())
    }

    async fn pause_for(&self, id: &str) {
        let delay = self.script().delays.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    async fn create_review(&self, review: &Review) -> SyncResult<()> {
        self.enter("create", review.id.as_str())?;
        self.put_review(review.clone());
        Ok(())
    }

    async fn update_review(&self, review: &Review) -> SyncResult<()> {
        self.enter("update", review.id.as_str())?;
        self.put_review(review.clone());
        Ok(())
    }

    async fn delete_review(&self, id: &str) -> SyncResult<()> {
        self.enter("delete", id)?;
        self.script().reviews.remove(id);
        Ok(())
    }

    async fn read_review(&self, id: &str) -> SyncResult<Review> {
        self.enter("read", id)?;
        self.pause_for(id).await;
        self.script()
            .reviews
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::UnexpectedStatus {
                route: format!("read {}", id),
                status: 404,
                body: String::new(),
            })
    }

    async fn list_reviews(&self) -> SyncResult<Vec<String>> {
        self.enter("list_reviews", "")?;
        Ok(self.script().review_ids.clone())
    }

    async fn search_titles(&self, title: &str) -> SyncResult<Vec<SearchResult>> {
        self.enter("search", title)?;
        Ok(self.script().search.clone())
    }

    async fn sync_catalog_ids(&self) -> SyncResult<Vec<CatalogId>> {
        self.enter("sync_catalog", "")?;
        let queued = self.script().catalog_responses.pop_front();
        match queued {
            Some((ids, after)) => {
                tokio::time::sleep(after).await;
                Ok(ids)
            }
            None => Ok(self.script().catalog_ids.clone()),
        }
    }

    async fn list_catalog(&self) -> SyncResult<Vec<CatalogEntry>> {
        self.enter("list_catalog", "")?;
        Ok(self.script().catalog.clone())
    }

    async fn read_review_meta(&self, review_id: &str) -> SyncResult<ReviewMeta> {
        self.enter("meta", review_id)?;
        self.script()
            .metas
            .get(review_id)
            .cloned()
            .ok_or_else(|| SyncError::UnexpectedStatus {
                route: format!("meta {}", review_id),
                status: 404,
                body: String::new(),
            })
    }

    async fn upload_review(&self, meta: &ReviewMeta) -> SyncResult<()> {
        self.enter("upload", meta.file_id.as_str())
    }

    async fn delegate(&self, file_id: &str, user_id: &str) -> SyncResult<()> {
        self.enter("delegate", format!("{}/{}", file_id, user_id))
    }

    async fn revoke(&self, file_id: &str, user_id: &str) -> SyncResult<()> {
        self.enter("revoke", format!("{}/{}", file_id, user_id))
    }

    async fn list_users(&self) -> SyncResult<Vec<String>> {
        self.enter("users", "")?;
        Ok(self.script().users.clone())
    }

    async fn list_gatekeeper_ids(&self, category: Category) -> SyncResult<Vec<String>> {
        self.enter("list_ids", category.as_str())?;
        Ok(self
            .script()
            .gatekeeper_ids
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_gatekeeper_domains(&self, category: Category, id: &str) -> SyncResult<Vec<String>> {
        self.enter("list_domains", format!("{}/{}", category, id))?;
        self.pause_for(id).await;
        Ok(self
            .script()
            .gatekeeper_domains
            .get(&(category, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn approve_access(&self, item: &GatekeeperItem) -> SyncResult<()> {
        self.enter("approve", format!("{}/{}", item.id, item.domain))
    }

    async fn reject_access(&self, item: &GatekeeperItem) -> SyncResult<()> {
        self.enter("reject", format!("{}/{}", item.id, item.domain))
    }

    async fn remove_access_entry(&self, entry: &AccessEntry) -> SyncResult<()> {
        self.enter("remove", entry.path())
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub(crate) fn engine(remote: &Arc<ScriptedRemote>) -> SyncEngine {
    engine_with(SyncConfig::default(), remote)
}

pub(crate) fn engine_with(config: SyncConfig, remote: &Arc<ScriptedRemote>) -> SyncEngine {
    SyncEngine::new(config, remote.clone())
}

/// Captures every payload published on a bus.
pub(crate) fn record<E>(bus: &EventBus<E>) -> Arc<Mutex<Vec<E>>>
where
    E: Clone + Send + 'static,
{
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    bus.register(move |_, event: &E| sink.lock().unwrap().push(event.clone()));
    log
}

pub(crate) fn review(id: &str, title: &str) -> Review {
    Review::new(id, title, Rating::new(4).unwrap(), "")
}
