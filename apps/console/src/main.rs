//! # Marquee Console
//!
//! Headless front end: mirrors the remote state and logs every delta.
//!
//! ## Usage
//! ```text
//! marquee-console [CONFIG_PATH]
//!
//! RUST_LOG=debug marquee-console
//! MARQUEE_BASE_URL=http://10.0.0.5:8080 marquee-console
//! ```

mod listeners;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use marquee_core::Category;
use marquee_sync::{SyncConfig, SyncEngine, SyncEngineBuilder};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Marquee console");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SyncConfig::load(config_path)?;
    info!(
        base_url = %config.remote.base_url,
        refresh_interval_secs = config.catalog.refresh_interval_secs,
        "Configuration loaded"
    );

    let refresh_interval = config.catalog.refresh_interval();
    let engine = Arc::new(SyncEngineBuilder::new(config).build()?);
    listeners::attach(&engine);

    match engine.bootstrap().await {
        Ok(report) => info!(
            reviews = report.reviews,
            users = report.users,
            catalog = report.catalog,
            "Initial sync done"
        ),
        Err(e) => warn!(error = %e, "Initial sync incomplete, continuing"),
    }

    for category in Category::ALL {
        if let Err(e) = engine.populate_category(category).await {
            warn!(category = %category, error = %e, "Gatekeeper population failed");
        }
    }

    let refresher = refresh_interval.map(|every| {
        info!(?every, "Periodic catalog refresh enabled");
        tokio::spawn(refresh_loop(engine.clone(), every))
    });

    shutdown_signal().await;

    if let Some(task) = refresher {
        task.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,marquee_sync=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Ticker for the refresh loop. A slow refresh pushes the next tick back
/// instead of queueing catch-up ticks.
fn refresh_ticker(every: Duration) -> Interval {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Reconciles the catalog on a fixed interval.
async fn refresh_loop(engine: Arc<SyncEngine>, every: Duration) {
    let mut ticker = refresh_ticker(every);
    // The first tick completes immediately; bootstrap already loaded the catalog.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = engine.refresh_catalog().await {
            warn!(error = %e, retryable = e.is_retryable(), "Catalog refresh failed");
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_refresh_ticker_delays_missed_ticks() {
        let every = Duration::from_secs(30);
        let mut ticker = refresh_ticker(every);
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Delay);
        assert_eq!(ticker.period(), every);

        let start = tokio::time::Instant::now();
        ticker.tick().await;

        // A refresh that overruns two periods yields one tick, not a burst.
        tokio::time::sleep(Duration::from_secs(75)).await;
        ticker.tick().await;
        let after_late = tokio::time::Instant::now();
        assert_eq!(after_late - start, Duration::from_secs(75));

        ticker.tick().await;
        assert_eq!(tokio::time::Instant::now() - after_late, every);
    }
}
