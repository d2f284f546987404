//! # HTTP Transport
//!
//! [`RemoteStore`] over HTTP with `reqwest`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         HttpRemoteStore                                 │
//! │                                                                         │
//! │  operation ──► Routes ──► Route { method, url, expected_status }        │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      reqwest::Client (timeout)                          │
//! │                              │                                          │
//! │            ┌─────────────────┼──────────────────┐                       │
//! │            ▼                 ▼                  ▼                       │
//! │      no response      status != expected   status == expected           │
//! │      RequestFailed    UnexpectedStatus     decode JSON body             │
//! │                                             └─ DecodeFailed on error    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures are returned as-is. Logging them is the engine's job.

use async_trait::async_trait;
use marquee_core::{AccessEntry, CatalogId, Category, GatekeeperItem, PublicationInfo, Review, ReviewMeta, SearchResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::RemoteSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{DelegationBody, Method, Route, Routes};
use crate::remote::{CatalogEntry, RemoteStore};

/// Production [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    routes: Routes,
}

impl HttpRemoteStore {
    pub fn new(settings: &RemoteSettings) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(HttpRemoteStore {
            client,
            routes: Routes::new(settings)?,
        })
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Sends a request and returns the body if the status matched.
    async fn execute<B: Serialize + ?Sized>(&self, route: &Route, body: Option<&B>) -> SyncResult<String> {
        trace!(route = %route, "Sending request");

        let request = match route.method {
            Method::Get => self.client.get(route.url.clone()),
            Method::Post => self.client.post(route.url.clone()),
        };
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !route.accepts(status) {
            return Err(SyncError::UnexpectedStatus {
                route: route.to_string(),
                status,
                body: text,
            });
        }

        debug!(route = %route, status, "Request succeeded");
        Ok(text)
    }

    async fn post_empty(&self, route: Route) -> SyncResult<()> {
        self.execute(&route, Some(&Value::Object(Default::default()))).await?;
        Ok(())
    }

    async fn post_json<B: Serialize + ?Sized>(&self, route: Route, body: &B) -> SyncResult<()> {
        self.execute(&route, Some(body)).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, route: Route) -> SyncResult<T> {
        let text = self.execute::<Value>(&route, None).await?;
        decode(&route, &text)
    }

    async fn post_for_json<T: DeserializeOwned>(&self, route: Route) -> SyncResult<T> {
        let text = self.execute(&route, Some(&Value::Object(Default::default()))).await?;
        decode(&route, &text)
    }
}

fn decode<T: DeserializeOwned>(route: &Route, text: &str) -> SyncResult<T> {
    serde_json::from_str(text).map_err(|e| SyncError::DecodeFailed {
        route: route.to_string(),
        reason: e.to_string(),
    })
}

/// Turns the `{id: info}` catalog listing into entries.
///
/// A missing or `null` info means the entry is not published yet. Entries
/// keep the server's key order.
fn catalog_entries(route: &Route, listing: serde_json::Map<String, Value>) -> SyncResult<Vec<CatalogEntry>> {
    listing
        .into_iter()
        .map(|(key, value)| {
            let info = match value {
                Value::Null => PublicationInfo::default(),
                other => serde_json::from_value(other).map_err(|e| SyncError::DecodeFailed {
                    route: route.to_string(),
                    reason: format!("entry {}: {}", key, e),
                })?,
            };
            Ok(CatalogEntry {
                catalog_id: CatalogId::parse(&key),
                info,
            })
        })
        .collect()
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create_review(&self, review: &Review) -> SyncResult<()> {
        self.post_json(self.routes.create_review(&review.id), review).await
    }

    async fn update_review(&self, review: &Review) -> SyncResult<()> {
        self.post_json(self.routes.update_review(&review.id), review).await
    }

    async fn delete_review(&self, id: &str) -> SyncResult<()> {
        self.post_empty(self.routes.delete_review(id)).await
    }

    async fn read_review(&self, id: &str) -> SyncResult<Review> {
        self.get_json(self.routes.read_review(id)).await
    }

    async fn list_reviews(&self) -> SyncResult<Vec<String>> {
        self.get_json(self.routes.list_reviews()).await
    }

    async fn search_titles(&self, title: &str) -> SyncResult<Vec<SearchResult>> {
        self.get_json(self.routes.search_titles(title)).await
    }

    async fn sync_catalog_ids(&self) -> SyncResult<Vec<CatalogId>> {
        self.post_for_json(self.routes.sync_catalog_ids()).await
    }

    async fn list_catalog(&self) -> SyncResult<Vec<CatalogEntry>> {
        let route = self.routes.list_catalog();
        let listing: serde_json::Map<String, Value> = self.get_json(route.clone()).await?;
        catalog_entries(&route, listing)
    }

    async fn read_review_meta(&self, review_id: &str) -> SyncResult<ReviewMeta> {
        self.get_json(self.routes.read_review_meta(review_id)).await
    }

    async fn upload_review(&self, meta: &ReviewMeta) -> SyncResult<()> {
        self.post_json(self.routes.upload_review(), meta).await
    }

    async fn delegate(&self, file_id: &str, user_id: &str) -> SyncResult<()> {
        let body = DelegationBody {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.post_json(self.routes.delegate(), &body).await
    }

    async fn revoke(&self, file_id: &str, user_id: &str) -> SyncResult<()> {
        let body = DelegationBody {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
        };
        self.post_json(self.routes.revoke(), &body).await
    }

    async fn list_users(&self) -> SyncResult<Vec<String>> {
        self.get_json(self.routes.list_users()).await
    }

    async fn list_gatekeeper_ids(&self, category: Category) -> SyncResult<Vec<String>> {
        self.post_for_json(self.routes.list_gatekeeper_ids(category)).await
    }

    async fn list_gatekeeper_domains(&self, category: Category, id: &str) -> SyncResult<Vec<String>> {
        self.post_for_json(self.routes.list_gatekeeper_domains(category, id)).await
    }

    async fn approve_access(&self, item: &GatekeeperItem) -> SyncResult<()> {
        self.post_empty(self.routes.approve_access(item)).await
    }

    async fn reject_access(&self, item: &GatekeeperItem) -> SyncResult<()> {
        self.post_empty(self.routes.reject_access(item)).await
    }

    async fn remove_access_entry(&self, entry: &AccessEntry) -> SyncResult<()> {
        self.post_empty(self.routes.remove_access_entry(entry)).await
    }
}
