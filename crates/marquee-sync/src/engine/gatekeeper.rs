//! Gatekeeper categories: population and access decisions.
//!
//! ## Population (two-level fan-out)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  populate_category(c)                                                   │
//! │                                                                         │
//! │  0. clear c           remote: remove_item per item (awaited)            │
//! │                       local:  drop items, emit remove                   │
//! │                                                                         │
//! │  1. list ids          POST op/list/c            → [a, b]                │
//! │                                                                         │
//! │  2. list domains      POST op/list/c/a   ─┐                             │
//! │     (join_all)        POST op/list/c/b   ─┤  any completion order       │
//! │                                           ▼                             │
//! │     each response inserts its (id, domain) pairs and emits populate     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clear finishes before stage 1 starts, so a late removal can never
//! drop a freshly populated item.

use futures_util::future::join_all;
use marquee_core::validation::validate_access_pair;
use marquee_core::{AccessEntry, Category, GatekeeperItem};
use tracing::{debug, info, warn};

use crate::config::{ClearStrategy, DecisionAppend};
use crate::error::SyncResult;
use crate::events::GatekeeperEvent;

use super::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn destination(self) -> Category {
        match self {
            Decision::Approve => Category::Approved,
            Decision::Reject => Category::Rejected,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Decision::Approve => "approve_access",
            Decision::Reject => "reject_access",
        }
    }

    fn event(self, entry: AccessEntry) -> GatekeeperEvent {
        match self {
            Decision::Approve => GatekeeperEvent::Approve(entry),
            Decision::Reject => GatekeeperEvent::Reject(entry),
        }
    }
}

impl SyncEngine {
    // =========================================================================
    // Population
    // =========================================================================

    /// Clears a category and re-fills it from the remote.
    ///
    /// Returns the number of items inserted. A failed stage-2 listing is
    /// logged and skipped; a failed stage-1 listing leaves the category
    /// empty and is returned.
    pub async fn populate_category(&self, category: Category) -> SyncResult<usize> {
        self.clear_category(category).await;

        let ids = self
            .remote
            .list_gatekeeper_ids(category)
            .await
            .map_err(|e| self.remote_failed("populate_category", e))?;

        if ids.is_empty() {
            info!(category = %category, "Category is empty");
            return Ok(0);
        }

        let fills = join_all(ids.iter().map(|id| self.populate_id(category, id))).await;

        let inserted: usize = fills.iter().filter_map(|r| r.as_ref().ok()).sum();
        let failed = fills.iter().filter(|r| r.is_err()).count();

        info!(category = %category, ids = ids.len(), inserted, failed, "Category populated");
        Ok(inserted)
    }

    async fn clear_category(&self, category: Category) {
        match self.config.gatekeeper.clear_strategy {
            ClearStrategy::Remote => {
                let items: Vec<GatekeeperItem> = self.with_state(|s| {
                    s.gatekeeper.items(category).iter().rev().cloned().collect()
                });
                if items.is_empty() {
                    return;
                }

                let removals = join_all(
                    items
                        .iter()
                        .map(|item| self.remove_item(category, &item.id, &item.domain)),
                )
                .await;

                let failed = removals.iter().filter(|r| r.is_err()).count();
                if failed > 0 {
                    warn!(category = %category, failed, "Some items survived the clear");
                }
                debug!(category = %category, cleared = items.len() - failed, "Category cleared");
            }
            ClearStrategy::Local => {
                let items = self.with_state(|s| std::mem::take(s.gatekeeper.items_mut(category)));

                for item in items.into_iter().rev() {
                    self.gatekeeper_bus
                        .notify(&GatekeeperEvent::Remove(item.in_category(category)));
                }
            }
        }
    }

    /// Stage 2 for one id: lists its domains and inserts the new pairs.
    async fn populate_id(&self, category: Category, id: &str) -> SyncResult<usize> {
        let domains = self
            .remote
            .list_gatekeeper_domains(category, id)
            .await
            .map_err(|e| self.remote_failed("populate_category", e))?;

        let added: Vec<AccessEntry> = self.with_state(|s| {
            let items = s.gatekeeper.items_mut(category);
            let mut added = Vec::new();
            for domain in domains {
                if items.iter().any(|i| i.matches(id, &domain)) {
                    continue;
                }
                items.push(GatekeeperItem::new(id, domain.clone()));
                added.push(AccessEntry::new(category, id, domain));
            }
            added
        });

        for entry in &added {
            self.gatekeeper_bus
                .notify(&GatekeeperEvent::Populate(entry.clone()));
        }
        Ok(added.len())
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    /// Approves a pending `(id, domain)` pair.
    ///
    /// Returns whether the decision was applied locally; see
    /// [`DecisionAppend`] for pairs that were not pending.
    pub async fn approve_access(&self, id: &str, domain: &str) -> SyncResult<bool> {
        self.decide(Decision::Approve, id, domain).await
    }

    /// Rejects a pending `(id, domain)` pair.
    pub async fn reject_access(&self, id: &str, domain: &str) -> SyncResult<bool> {
        self.decide(Decision::Reject, id, domain).await
    }

    async fn decide(&self, decision: Decision, id: &str, domain: &str) -> SyncResult<bool> {
        validate_access_pair(id, domain)?;
        let item = GatekeeperItem::new(id, domain);

        let confirmed = match decision {
            Decision::Approve => self.remote.approve_access(&item).await,
            Decision::Reject => self.remote.reject_access(&item).await,
        };
        confirmed.map_err(|e| self.remote_failed(decision.operation(), e))?;

        let destination = decision.destination();
        let append = self.config.gatekeeper.decision_append;

        let applied = self.with_state(|s| {
            let pending = s.gatekeeper.items_mut(Category::Pending);
            let was_pending = match pending.iter().rposition(|i| i.matches(id, domain)) {
                Some(inx) => {
                    pending.remove(inx);
                    true
                }
                None => false,
            };

            if !was_pending && append == DecisionAppend::RequirePending {
                return false;
            }

            let target = s.gatekeeper.items_mut(destination);
            if !target.iter().any(|i| i.matches(id, domain)) {
                target.push(item.clone());
            }
            true
        });

        if !applied {
            warn!(
                id,
                domain,
                destination = %destination,
                "Decision confirmed for an item that was not pending; local state unchanged"
            );
            return Ok(false);
        }

        debug!(id, domain, destination = %destination, "Access decided");
        self.gatekeeper_bus
            .notify(&decision.event(item.in_category(destination)));
        Ok(true)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes one entry remotely, then locally.
    ///
    /// Emits `remove` once the remote confirms, whether or not the item was
    /// held locally. Returns whether it was.
    pub async fn remove_item(&self, category: Category, id: &str, domain: &str) -> SyncResult<bool> {
        validate_access_pair(id, domain)?;
        let entry = AccessEntry::new(category, id, domain);

        self.remote
            .remove_access_entry(&entry)
            .await
            .map_err(|e| self.remote_failed("remove_item", e))?;

        let existed = self.with_state(|s| {
            let items = s.gatekeeper.items_mut(category);
            match items.iter().rposition(|i| i.matches(id, domain)) {
                Some(inx) => {
                    items.remove(inx);
                    true
                }
                None => false,
            }
        });

        debug!(entry = %entry.path(), existed, "Gatekeeper item removed");
        self.gatekeeper_bus.notify(&GatekeeperEvent::Remove(entry));
        Ok(existed)
    }
}
