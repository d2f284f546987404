//! # marquee-sync: Sync Engine for the Review Mirror
//!
//! Mirrors authoritative server-side state (movie reviews, the shared
//! catalog of published reviews, and the gatekeeper access queue) and
//! keeps it consistent as users act and the server changes underneath.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Engine Architecture                         │
//! │                                                                         │
//! │   user action / timer                                                   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SyncEngine                               │  │
//! │  │                                                                  │  │
//! │  │  Owns reviews, search results, catalog mirror, gatekeeper        │  │
//! │  │  categories and users. Mutates them only when a remote call      │  │
//! │  │  succeeds, then publishes the delta.                             │  │
//! │  └───────────┬───────────────────────────────────────┬──────────────┘  │
//! │              │                                       │                  │
//! │              ▼                                       ▼                  │
//! │  ┌────────────────────────┐            ┌─────────────────────────────┐ │
//! │  │  RemoteStore (trait)   │            │  EventBus × 4               │ │
//! │  │                        │            │                             │ │
//! │  │  HttpRemoteStore:      │            │  reviews · search ·         │ │
//! │  │  reqwest + route table │            │  catalog · gatekeeper       │ │
//! │  └────────────────────────┘            └─────────────────────────────┘ │
//! │                                                      │                  │
//! │                                                      ▼                  │
//! │                                        presentation listeners          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`bus`] - Listener registry per stream
//! - [`config`] - Sync configuration (endpoints, catalog and gatekeeper behavior)
//! - [`engine`] - `SyncEngine`: CRUD, reconciliation, category population
//! - [`error`] - Sync error types
//! - [`events`] - Event payloads per stream
//! - [`protocol`] - Remote route table
//! - [`remote`] - `RemoteStore` trait
//! - [`transport`] - HTTP implementation of `RemoteStore`
//!
//! ## Usage
//! ```rust,no_run
//! use marquee_sync::{SyncConfig, SyncEngineBuilder, ReviewEvent};
//!
//! # async fn run() -> marquee_sync::SyncResult<()> {
//! let engine = SyncEngineBuilder::new(SyncConfig::load(None)?).build()?;
//!
//! engine.review_events().register(|_, event| match event {
//!     ReviewEvent::Create(review) => println!("+ {}", review.title),
//!     ReviewEvent::Remove(review) => println!("- {}", review.title),
//!     ReviewEvent::Read(_) | ReviewEvent::Update(_) => {}
//! });
//!
//! engine.bootstrap().await?;
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod protocol;
pub mod remote;
pub mod transport;

pub use bus::{EventBus, EventSource, Listener, Stream};
pub use config::{ClearStrategy, DecisionAppend, SyncConfig};
pub use engine::{BootstrapReport, CatalogDelta, SyncEngine, SyncEngineBuilder};
pub use error::{SyncError, SyncResult};
pub use events::{CatalogEvent, GatekeeperEvent, ReviewEvent, SearchEvent};
pub use remote::{CatalogEntry, RemoteStore};
pub use transport::HttpRemoteStore;
