//! Log-line presentation of the engine's event streams.

use marquee_core::{AccessEntry, Review};
use marquee_sync::{CatalogEvent, GatekeeperEvent, ReviewEvent, SearchEvent, SyncEngine};
use tracing::info;

/// Registers one logging listener per stream.
pub fn attach(engine: &SyncEngine) {
    engine.review_events().register(|source, event| {
        info!(stream = %source.stream, "{}", describe_review(event));
    });
    engine.search_events().register(|source, event| {
        info!(stream = %source.stream, "{}", describe_search(event));
    });
    engine.catalog_events().register(|source, event| {
        info!(stream = %source.stream, "{}", describe_catalog(event));
    });
    engine.gatekeeper_events().register(|source, event| {
        info!(stream = %source.stream, "{}", describe_gatekeeper(event));
    });
}

fn review_line(review: &Review) -> String {
    format!("{} \"{}\" ({}/5)", review.id, review.title, review.rating)
}

fn entry_line(entry: &AccessEntry) -> String {
    entry.path()
}

pub fn describe_review(event: &ReviewEvent) -> String {
    match event {
        ReviewEvent::Create(r) => format!("review created: {}", review_line(r)),
        ReviewEvent::Read(r) => format!("review loaded: {}", review_line(r)),
        ReviewEvent::Update(r) => format!("review updated: {}", review_line(r)),
        ReviewEvent::Remove(r) => format!("review removed: {}", r.id),
    }
}

pub fn describe_search(event: &SearchEvent) -> String {
    match event {
        SearchEvent::Create(hit) => format!("search hit restored: {} \"{}\"", hit.id, hit.title),
        SearchEvent::Remove(hit) => format!("search hit reviewed: {} \"{}\"", hit.id, hit.title),
        SearchEvent::Results(hits) => format!("search returned {} unreviewed titles", hits.len()),
    }
}

pub fn describe_catalog(event: &CatalogEvent) -> String {
    match event {
        CatalogEvent::Create { catalog_id, review } => match review {
            Some(r) => format!("catalog entry {}: {}", catalog_id, review_line(r)),
            None => format!("catalog entry {}", catalog_id),
        },
        CatalogEvent::Remove { catalog_id } => format!("catalog entry {} withdrawn", catalog_id),
        CatalogEvent::Read {
            catalog_id,
            review,
            info,
        } => format!(
            "catalog entry {} published as {} to {} user(s): {}",
            catalog_id,
            info.file_id.as_deref().unwrap_or("-"),
            info.delegations.len(),
            review_line(review)
        ),
        CatalogEvent::Uploaded {
            catalog_id,
            file_id,
        } => format!("catalog entry {} uploaded as {}", catalog_id, file_id),
        CatalogEvent::Delegated(grant) => {
            format!("{} delegated to {}", grant.catalog_id, grant.user_id)
        }
        CatalogEvent::Revoked(grant) => {
            format!("{} revoked from {}", grant.catalog_id, grant.user_id)
        }
    }
}

pub fn describe_gatekeeper(event: &GatekeeperEvent) -> String {
    match event {
        GatekeeperEvent::Populate(e) => format!("gatekeeper + {}", entry_line(e)),
        GatekeeperEvent::Remove(e) => format!("gatekeeper - {}", entry_line(e)),
        GatekeeperEvent::Approve(e) => format!("gatekeeper approved {}", entry_line(e)),
        GatekeeperEvent::Reject(e) => format!("gatekeeper rejected {}", entry_line(e)),
    }
}
