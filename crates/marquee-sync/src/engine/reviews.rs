//! Review CRUD and title search.
//!
//! Keeps the search results disjoint from the reviews: any review that
//! enters the collection leaves the search results, and a removed review
//! goes back into them when it matches the last query.

use futures_util::future::join_all;
use marquee_core::validation::{validate_identifier, validate_review, validate_search_query};
use marquee_core::{Rating, Review, SearchResult};
use tracing::{debug, info};

use crate::error::SyncResult;
use crate::events::{ReviewEvent, SearchEvent};

use super::SyncEngine;

impl SyncEngine {
    // =========================================================================
    // Review CRUD
    // =========================================================================

    pub async fn create_review(&self, review: Review) -> SyncResult<()> {
        validate_review(&review)?;

        self.remote
            .create_review(&review)
            .await
            .map_err(|e| self.remote_failed("create_review", e))?;

        debug!(id = %review.id, "Review created");
        self.store_review(ReviewEvent::Create(review));
        Ok(())
    }

    pub async fn update_review(&self, review: Review) -> SyncResult<()> {
        validate_review(&review)?;

        self.remote
            .update_review(&review)
            .await
            .map_err(|e| self.remote_failed("update_review", e))?;

        debug!(id = %review.id, "Review updated");
        self.store_review(ReviewEvent::Update(review));
        Ok(())
    }

    /// Reads one review from the remote and mirrors it locally.
    pub async fn read_review(&self, id: &str) -> SyncResult<Review> {
        validate_identifier("id", id)?;

        let review = self
            .remote
            .read_review(id)
            .await
            .map_err(|e| self.remote_failed("read_review", e))?;

        self.store_review(ReviewEvent::Read(review.clone()));
        Ok(review)
    }

    /// Deletes a review.
    ///
    /// `title` describes the movie when the review is not held locally.
    /// Afterwards the movie re-enters the search results if it matches the
    /// last query.
    pub async fn remove_review(&self, id: &str, title: &str) -> SyncResult<()> {
        validate_identifier("id", id)?;

        self.remote
            .delete_review(id)
            .await
            .map_err(|e| self.remote_failed("remove_review", e))?;

        let (removed, restored) = self.with_state(|s| {
            let removed = s
                .remove_review(id)
                .unwrap_or_else(|| Review::new(id, title, Rating::default(), ""));

            let summary = removed.summary();
            let restored = (summary.matches_query(&s.last_search)
                && !s.search.iter().any(|r| r.id == summary.id))
            .then(|| {
                s.search.push(summary.clone());
                summary
            });

            (removed, restored)
        });

        debug!(id, restored = restored.is_some(), "Review removed");
        self.review_bus.notify(&ReviewEvent::Remove(removed));
        if let Some(result) = restored {
            self.search_bus.notify(&SearchEvent::Create(result));
        }
        Ok(())
    }

    /// Lists every review id on the remote, then reads them all concurrently.
    ///
    /// Each successful read emits `read`. Returns how many reads succeeded;
    /// failed reads are logged and skipped.
    pub async fn list_reviews(&self) -> SyncResult<usize> {
        let ids = self
            .remote
            .list_reviews()
            .await
            .map_err(|e| self.remote_failed("list_reviews", e))?;

        let reads = join_all(ids.iter().map(|id| self.read_review(id))).await;
        let loaded = reads.iter().filter(|r| r.is_ok()).count();

        info!(listed = ids.len(), loaded, "Reviews loaded");
        Ok(loaded)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Searches titles and replaces the search results with every hit that
    /// has not been reviewed yet.
    pub async fn search(&self, title: &str) -> SyncResult<Vec<SearchResult>> {
        let query = validate_search_query(title)?;

        let hits = self
            .remote
            .search_titles(&query)
            .await
            .map_err(|e| self.remote_failed("search", e))?;

        let results = self.with_state(|s| {
            s.search = hits.into_iter().filter(|r| !s.is_reviewed(&r.id)).collect();
            s.last_search = query.clone();
            s.search.clone()
        });

        debug!(query = %query, results = results.len(), "Search completed");
        self.search_bus.notify(&SearchEvent::Results(results.clone()));
        Ok(results)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Upserts the event's review, drops it from the search results, then
    /// publishes.
    fn store_review(&self, event: ReviewEvent) {
        let hit = self.with_state(|s| {
            let review = event.review();
            s.upsert_review(review.clone());
            s.take_search_hit(&review.id)
        });

        self.review_bus.notify(&event);
        if let Some(hit) = hit {
            self.search_bus.notify(&SearchEvent::Remove(hit));
        }
    }
}
