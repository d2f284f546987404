//! Catalog mirror: set-difference reconciliation and publication actions.
//!
//! ## Reconciliation
//! ```text
//!   mirror  [1, 2, 3]          remote [2, 3, 4]
//!
//!   remote \ mirror = {4}  ──► create cata_4   (with the local review, if any)
//!   mirror \ remote = {1}  ──► remove cata_1
//!   mirror := remote       ──► [2, 3, 4]
//! ```
//! Only the difference is published, so the presentation layer never
//! re-renders the whole listing.

use std::collections::HashSet;

use futures_util::future::join_all;
use marquee_core::validation::validate_identifier;
use marquee_core::{AccessGrant, CatalogId};
use tracing::{debug, info};

use crate::error::SyncResult;
use crate::events::CatalogEvent;
use crate::remote::CatalogEntry;

use super::SyncEngine;

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDelta {
    /// Ids that entered the mirror, in remote order.
    pub created: Vec<CatalogId>,

    /// Ids that left the mirror, in previous mirror order.
    pub removed: Vec<CatalogId>,
}

impl CatalogDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Counts from a full bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub reviews: usize,
    pub users: usize,
    pub catalog: usize,
}

impl SyncEngine {
    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Applies an authoritative listing to the mirror.
    ///
    /// Emits `create` for every id new to the mirror, then `remove` for
    /// every id gone from the listing, then replaces the mirror with
    /// `remote_ids` as given (order kept, duplicates not collapsed).
    pub fn reconcile_catalog_with(&self, remote_ids: Vec<CatalogId>) -> CatalogDelta {
        let (delta, events) = self.with_state(|s| {
            let mut delta = CatalogDelta::default();
            let mut events = Vec::new();

            let local: HashSet<&CatalogId> = s.catalog.iter().collect();
            let remote: HashSet<&CatalogId> = remote_ids.iter().collect();

            for id in remote_ids.iter().filter(|id| !local.contains(id)) {
                events.push(CatalogEvent::Create {
                    catalog_id: id.clone(),
                    review: s.find_review(id.review_id()).cloned(),
                });
                delta.created.push(id.clone());
            }

            for id in s.catalog.iter().filter(|id| !remote.contains(id)) {
                events.push(CatalogEvent::Remove {
                    catalog_id: id.clone(),
                });
                delta.removed.push(id.clone());
            }

            s.catalog = remote_ids;
            (delta, events)
        });

        for event in &events {
            self.catalog_bus.notify(event);
        }

        if delta.is_empty() {
            debug!("Catalog unchanged");
        } else {
            info!(
                created = delta.created.len(),
                removed = delta.removed.len(),
                "Catalog reconciled"
            );
        }
        delta
    }

    /// Fetches the authoritative listing and reconciles against it.
    ///
    /// With `catalog.serialize_reconcile` set, a call waits for any
    /// reconciliation already in flight. Otherwise concurrent calls may
    /// interleave and the mirror reflects the last completed response.
    pub async fn reconcile_catalog(&self) -> SyncResult<CatalogDelta> {
        let _serial = if self.config.catalog.serialize_reconcile {
            Some(self.reconcile_gate.lock().await)
        } else {
            None
        };

        let remote_ids = self
            .remote
            .sync_catalog_ids()
            .await
            .map_err(|e| self.remote_failed("reconcile_catalog", e))?;

        Ok(self.reconcile_catalog_with(remote_ids))
    }

    /// Initial catalog load.
    ///
    /// Sets the mirror from the listing without diffing, then reads every
    /// listed review concurrently: unpublished entries emit `create`,
    /// published ones emit `read` with their publication info. Returns how
    /// many entries loaded.
    pub async fn init_catalog(&self) -> SyncResult<usize> {
        let entries = self
            .remote
            .list_catalog()
            .await
            .map_err(|e| self.remote_failed("init_catalog", e))?;

        self.with_state(|s| {
            s.catalog = entries.iter().map(|e| e.catalog_id.clone()).collect();
        });

        let total = entries.len();
        let loads = join_all(entries.into_iter().map(|e| self.load_catalog_entry(e))).await;
        let loaded = loads.iter().filter(|r| r.is_ok()).count();

        info!(total, loaded, "Catalog loaded");
        Ok(loaded)
    }

    async fn load_catalog_entry(&self, entry: CatalogEntry) -> SyncResult<()> {
        let review = self
            .remote
            .read_review(entry.catalog_id.review_id())
            .await
            .map_err(|e| self.remote_failed("init_catalog", e))?;

        let event = if entry.info.is_unpublished() {
            CatalogEvent::Create {
                catalog_id: entry.catalog_id,
                review: Some(review),
            }
        } else {
            CatalogEvent::Read {
                catalog_id: entry.catalog_id,
                review,
                info: entry.info,
            }
        };

        self.catalog_bus.notify(&event);
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Replaces the delegation-eligible user list. Returns its length.
    pub async fn refresh_users(&self) -> SyncResult<usize> {
        let users = self
            .remote
            .list_users()
            .await
            .map_err(|e| self.remote_failed("refresh_users", e))?;

        let count = users.len();
        self.with_state(|s| s.users = users);

        debug!(count, "Users refreshed");
        Ok(count)
    }

    /// Refreshes users and reconciles the catalog concurrently.
    pub async fn refresh_catalog(&self) -> SyncResult<CatalogDelta> {
        let (users, delta) = tokio::join!(self.refresh_users(), self.reconcile_catalog());
        users?;
        delta
    }

    // =========================================================================
    // Publication
    // =========================================================================

    /// Uploads a catalog entry's review. Returns the uploaded file id.
    pub async fn upload_review(&self, catalog_id: &CatalogId) -> SyncResult<String> {
        validate_identifier("id", catalog_id.review_id())?;

        let meta = self
            .remote
            .read_review_meta(catalog_id.review_id())
            .await
            .map_err(|e| self.remote_failed("upload_review", e))?;

        self.remote
            .upload_review(&meta)
            .await
            .map_err(|e| self.remote_failed("upload_review", e))?;

        info!(catalog_id = %catalog_id, file_id = %meta.file_id, "Review uploaded");
        self.catalog_bus.notify(&CatalogEvent::Uploaded {
            catalog_id: catalog_id.clone(),
            file_id: meta.file_id.clone(),
        });
        Ok(meta.file_id)
    }

    /// Grants a user access to an uploaded review.
    pub async fn delegate(&self, grant: AccessGrant) -> SyncResult<()> {
        validate_identifier("file_id", &grant.file_id)?;
        validate_identifier("user_id", &grant.user_id)?;

        self.remote
            .delegate(&grant.file_id, &grant.user_id)
            .await
            .map_err(|e| self.remote_failed("delegate", e))?;

        info!(catalog_id = %grant.catalog_id, user = %grant.user_id, "Access delegated");
        self.catalog_bus.notify(&CatalogEvent::Delegated(grant));
        Ok(())
    }

    /// Withdraws a user's access to an uploaded review.
    pub async fn revoke(&self, grant: AccessGrant) -> SyncResult<()> {
        validate_identifier("file_id", &grant.file_id)?;
        validate_identifier("user_id", &grant.user_id)?;

        self.remote
            .revoke(&grant.file_id, &grant.user_id)
            .await
            .map_err(|e| self.remote_failed("revoke", e))?;

        info!(catalog_id = %grant.catalog_id, user = %grant.user_id, "Access revoked");
        self.catalog_bus.notify(&CatalogEvent::Revoked(grant));
        Ok(())
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Initial sync: reviews, users and catalog, concurrently.
    ///
    /// All three run to completion; the first failure is returned.
    pub async fn bootstrap(&self) -> SyncResult<BootstrapReport> {
        let (reviews, users, catalog) =
            tokio::join!(self.list_reviews(), self.refresh_users(), self.init_catalog());

        let report = BootstrapReport {
            reviews: reviews?,
            users: users?,
            catalog: catalog?,
        };

        info!(
            reviews = report.reviews,
            users = report.users,
            catalog = report.catalog,
            "Bootstrap complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use marquee_core::{AccessGrant, CatalogId, PublicationInfo, ReviewMeta};

    use super::super::testing::{engine, engine_with, record, review, ScriptedRemote};
    use super::CatalogDelta;
    use crate::config::SyncConfig;
    use crate::events::CatalogEvent;

    fn ids(raw: &[&str]) -> Vec<CatalogId> {
        raw.iter().map(|s| CatalogId::parse(s)).collect()
    }

    #[tokio::test]
    async fn test_reconcile_emits_only_the_difference() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        engine.reconcile_catalog_with(ids(&["1", "2", "3"]));
        let events = record(engine.catalog_events());

        let delta = engine.reconcile_catalog_with(ids(&["2", "3", "4"]));

        assert_eq!(
            delta,
            CatalogDelta {
                created: ids(&["4"]),
                removed: ids(&["1"]),
            }
        );
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                CatalogEvent::Create {
                    catalog_id: CatalogId::from_review_id("4"),
                    review: None,
                },
                CatalogEvent::Remove {
                    catalog_id: CatalogId::from_review_id("1"),
                },
            ]
        );
        assert_eq!(engine.catalog_mirror(), ids(&["2", "3", "4"]));
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_silent() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        engine.reconcile_catalog_with(ids(&["5", "6"]));
        let events = record(engine.catalog_events());

        let delta = engine.reconcile_catalog_with(ids(&["5", "6"]));

        assert!(delta.is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_counts_match_set_difference() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);

        let rounds: [&[&str]; 4] = [
            &["a", "b", "c"],
            &["c", "d"],
            &[],
            &["e", "a", "f", "g"],
        ];

        let mut previous: Vec<&str> = Vec::new();
        for round in rounds {
            let events = record(engine.catalog_events());
            engine.reconcile_catalog_with(ids(round));

            let created = round.iter().filter(|id| !previous.contains(*id)).count();
            let removed = previous.iter().filter(|id| !round.contains(*id)).count();
            let log = events.lock().unwrap();
            assert_eq!(log.iter().filter(|e| e.kind() == "create").count(), created);
            assert_eq!(log.iter().filter(|e| e.kind() == "remove").count(), removed);
            drop(log);

            previous = round.to_vec();
        }
    }

    #[tokio::test]
    async fn test_reconcile_attaches_local_review() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        engine.create_review(review("7", "Heat")).await.unwrap();
        let events = record(engine.catalog_events());

        engine.reconcile_catalog_with(ids(&["cata_7"]));

        assert_eq!(
            *events.lock().unwrap(),
            vec![CatalogEvent::Create {
                catalog_id: CatalogId::from_review_id("7"),
                review: Some(review("7", "Heat")),
            }]
        );
    }

    #[tokio::test]
    async fn test_reconcile_catalog_fetches_listing() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_catalog_ids(&["cata_1", "cata_2"]);
        let engine = engine(&remote);

        let delta = engine.reconcile_catalog().await.unwrap();

        assert_eq!(delta.created, ids(&["1", "2"]));
        assert_eq!(remote.calls(), vec!["sync_catalog"]);
    }

    #[tokio::test]
    async fn test_failed_listing_keeps_mirror() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        engine.reconcile_catalog_with(ids(&["1"]));
        remote.fail("sync_catalog");

        assert!(engine.reconcile_catalog().await.is_err());
        assert_eq!(engine.catalog_mirror(), ids(&["1"]));
    }

    #[tokio::test]
    async fn test_reconcile_attaches_review_with_inner_prefix() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        engine.create_review(review("tt_cata_5", "Alien")).await.unwrap();
        let events = record(engine.catalog_events());

        remote.set_catalog_ids(&["cata_tt_cata_5"]);
        engine.reconcile_catalog().await.unwrap();

        assert_eq!(engine.catalog_mirror(), ids(&["tt_cata_5"]));
        assert_eq!(
            *events.lock().unwrap(),
            vec![CatalogEvent::Create {
                catalog_id: CatalogId::from_review_id("tt_cata_5"),
                review: Some(review("tt_cata_5", "Alien")),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialized_reconciliations() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.queue_catalog_ids(&["1", "2"], Duration::from_millis(50));
        remote.queue_catalog_ids(&["2", "3"], Duration::from_millis(10));
        let mut config = SyncConfig::default();
        config.catalog.serialize_reconcile = true;
        let engine = engine_with(config, &remote);
        let events = record(engine.catalog_events());

        let (first, second) = tokio::join!(engine.reconcile_catalog(), engine.reconcile_catalog());
        let (first, second) = (first.unwrap(), second.unwrap());

        // The second call only fetches once the first has settled, and
        // diffs against its result.
        assert_eq!(first.created, ids(&["1", "2"]));
        assert!(first.removed.is_empty());
        assert_eq!(second.created, ids(&["3"]));
        assert_eq!(second.removed, ids(&["1"]));
        assert_eq!(events.lock().unwrap().len(), 4);
        assert_eq!(engine.catalog_mirror(), ids(&["2", "3"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unserialized_reconciliations_settle_on_last_response() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.queue_catalog_ids(&["1", "2"], Duration::from_millis(50));
        remote.queue_catalog_ids(&["2", "3"], Duration::from_millis(10));
        let engine = engine(&remote);
        assert!(!engine.config().catalog.serialize_reconcile);

        let (slow, fast) = tokio::join!(engine.reconcile_catalog(), engine.reconcile_catalog());
        let (slow, fast) = (slow.unwrap(), fast.unwrap());

        // Both listings were in flight at once; the faster one lands first.
        assert_eq!(remote.calls_to("sync_catalog").len(), 2);
        assert_eq!(fast.created, ids(&["2", "3"]));
        assert!(fast.removed.is_empty());
        assert_eq!(slow.created, ids(&["1"]));
        assert_eq!(slow.removed, ids(&["3"]));
        assert_eq!(engine.catalog_mirror(), ids(&["1", "2"]));
    }

    #[tokio::test]
    async fn test_init_catalog_splits_published_entries() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.put_review(review("1", "Alien"));
        remote.put_review(review("2", "Heat"));
        let published = PublicationInfo {
            file_id: Some("f2".to_string()),
            delegations: vec!["alice".to_string()],
        };
        remote.set_catalog_listing(vec![
            ("1", PublicationInfo::default()),
            ("2", published.clone()),
        ]);
        let engine = engine(&remote);
        let events = record(engine.catalog_events());

        let loaded = engine.init_catalog().await.unwrap();

        assert_eq!(loaded, 2);
        assert_eq!(engine.catalog_mirror(), ids(&["1", "2"]));
        // Catalog reads do not populate the review collection.
        assert_eq!(engine.count_review(), 0);

        let log = events.lock().unwrap();
        assert!(log.contains(&CatalogEvent::Create {
            catalog_id: CatalogId::from_review_id("1"),
            review: Some(review("1", "Alien")),
        }));
        assert!(log.contains(&CatalogEvent::Read {
            catalog_id: CatalogId::from_review_id("2"),
            review: review("2", "Heat"),
            info: published,
        }));
    }

    #[tokio::test]
    async fn test_upload_review() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.put_meta(
            "42",
            ReviewMeta {
                file_id: "f42".to_string(),
                extra: Default::default(),
            },
        );
        let engine = engine(&remote);
        let events = record(engine.catalog_events());

        let file_id = engine
            .upload_review(&CatalogId::from_review_id("42"))
            .await
            .unwrap();

        assert_eq!(file_id, "f42");
        assert_eq!(remote.calls(), vec!["meta 42", "upload f42"]);
        assert_eq!(
            *events.lock().unwrap(),
            vec![CatalogEvent::Uploaded {
                catalog_id: CatalogId::from_review_id("42"),
                file_id: "f42".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_upload_requires_meta() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        let events = record(engine.catalog_events());

        assert!(engine.upload_review(&CatalogId::from_review_id("1")).await.is_err());
        assert!(remote.calls_to("upload").is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delegate_and_revoke() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        let events = record(engine.catalog_events());
        let grant = AccessGrant {
            catalog_id: CatalogId::from_review_id("2"),
            file_id: "f2".to_string(),
            user_id: "bob".to_string(),
        };

        engine.delegate(grant.clone()).await.unwrap();
        engine.revoke(grant.clone()).await.unwrap();

        assert_eq!(remote.calls(), vec!["delegate f2/bob", "revoke f2/bob"]);
        assert_eq!(
            *events.lock().unwrap(),
            vec![CatalogEvent::Delegated(grant.clone()), CatalogEvent::Revoked(grant)]
        );
    }

    #[tokio::test]
    async fn test_delegate_requires_user() {
        let remote = Arc::new(ScriptedRemote::new());
        let engine = engine(&remote);
        let grant = AccessGrant {
            catalog_id: CatalogId::from_review_id("2"),
            file_id: "f2".to_string(),
            user_id: String::new(),
        };

        assert!(engine.delegate(grant).await.is_err());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_catalog_updates_users_and_mirror() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_users(&["alice", "bob"]);
        remote.set_catalog_ids(&["cata_9"]);
        let engine = engine(&remote);

        let delta = engine.refresh_catalog().await.unwrap();

        assert_eq!(engine.users(), vec!["alice", "bob"]);
        assert_eq!(delta.created, ids(&["9"]));
    }

    #[tokio::test]
    async fn test_refresh_catalog_reports_user_failure() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.set_catalog_ids(&["cata_9"]);
        remote.fail("users");
        let engine = engine(&remote);

        assert!(engine.refresh_catalog().await.is_err());
        // The reconciliation still ran.
        assert_eq!(engine.catalog_mirror(), ids(&["9"]));
    }

    #[tokio::test]
    async fn test_bootstrap() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.put_review(review("1", "Alien"));
        remote.set_review_ids(&["1"]);
        remote.set_users(&["alice"]);
        remote.set_catalog_listing(vec![("1", PublicationInfo::default())]);
        let engine = engine(&remote);

        let report = engine.bootstrap().await.unwrap();

        assert_eq!(report.reviews, 1);
        assert_eq!(report.users, 1);
        assert_eq!(report.catalog, 1);
        assert!(engine.is_reviewed("1"));
        assert_eq!(engine.catalog_mirror(), ids(&["1"]));
    }
}
