//! # Sync Configuration
//!
//! Configuration management for the sync engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MARQUEE_BASE_URL=http://10.0.0.5:8080                              │
//! │     MARQUEE_CLEAR_STRATEGY=local                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/marquee/marquee.toml (Linux)                             │
//! │     ~/Library/Application Support/com.marquee.marquee/marquee.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Local server, remote clears, pending-only decisions                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # marquee.toml
//! [remote]
//! base_url = "http://127.0.0.1:8080"
//! search_url = "http://127.0.0.1:8081"   # optional, defaults to base_url
//! request_timeout_secs = 30
//!
//! [catalog]
//! serialize_reconcile = false
//! refresh_interval_secs = 0              # 0 disables periodic refresh
//!
//! [gatekeeper]
//! clear_strategy = "remote"              # remote | local
//! decision_append = "require_pending"    # require_pending | always
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Gatekeeper Strategies
// =============================================================================

/// How a category is emptied before it is re-populated.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  REMOTE (Default)                   │  LOCAL                            │
/// │  ────────────────                   │  ─────                            │
/// │  • One remote removal per item      │  • Local items dropped directly   │
/// │  • Item leaves local state when     │  • No remote traffic              │
/// │    its removal is confirmed         │  • Remove events still emitted    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearStrategy {
    #[default]
    Remote,
    Local,
}

impl std::fmt::Display for ClearStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClearStrategy::Remote => write!(f, "remote"),
            ClearStrategy::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for ClearStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(ClearStrategy::Remote),
            "local" => Ok(ClearStrategy::Local),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown clear strategy: '{}'. Valid options: remote, local",
                other
            ))),
        }
    }
}

/// Whether an approve/reject appends to the destination category when the
/// pair was not found in `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAppend {
    /// Append only when a pending item was actually moved.
    #[default]
    RequirePending,

    /// Append unconditionally once the remote confirms.
    Always,
}

impl std::fmt::Display for DecisionAppend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionAppend::RequirePending => write!(f, "require_pending"),
            DecisionAppend::Always => write!(f, "always"),
        }
    }
}

impl std::str::FromStr for DecisionAppend {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "require_pending" | "pending" => Ok(DecisionAppend::RequirePending),
            "always" => Ok(DecisionAppend::Always),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown decision append mode: '{}'. Valid options: require_pending, always",
                other
            ))),
        }
    }
}

// =============================================================================
// Remote Settings
// =============================================================================

/// Where the remote services live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the review/catalog/gatekeeper server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the title-search service. Falls back to `base_url`.
    #[serde(default)]
    pub search_url: Option<String>,

    /// Mount path of the review service.
    #[serde(default = "default_review_path")]
    pub review_path: String,

    /// Mount path of the catalog service.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Mount path of the gatekeeper service.
    #[serde(default = "default_gatekeeper_path")]
    pub gatekeeper_path: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_review_path() -> String {
    "/review".to_string()
}

fn default_catalog_path() -> String {
    "/catalog".to_string()
}

fn default_gatekeeper_path() -> String {
    "/gatekeeper".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            base_url: default_base_url(),
            search_url: None,
            review_path: default_review_path(),
            catalog_path: default_catalog_path(),
            gatekeeper_path: default_gatekeeper_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl RemoteSettings {
    /// Parsed base URL.
    pub fn base(&self) -> SyncResult<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    /// Parsed search URL, falling back to the base URL.
    pub fn search_base(&self) -> SyncResult<Url> {
        match self.search_url {
            Some(ref url) => Ok(Url::parse(url)?),
            None => self.base(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Catalog Settings
// =============================================================================

/// Catalog mirror behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Run at most one listing + reconcile at a time.
    #[serde(default)]
    pub serialize_reconcile: bool,

    /// Periodic catalog refresh interval (seconds). 0 disables it.
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl CatalogSettings {
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

// =============================================================================
// Gatekeeper Settings
// =============================================================================

/// Gatekeeper population and decision behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatekeeperSettings {
    #[serde(default)]
    pub clear_strategy: ClearStrategy,

    #[serde(default)]
    pub decision_append: DecisionAppend,
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote endpoints.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Catalog mirror settings.
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Gatekeeper settings.
    #[serde(default)]
    pub gatekeeper: GatekeeperSettings,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (marquee.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        for (name, raw) in [
            ("base_url", Some(&self.remote.base_url)),
            ("search_url", self.remote.search_url.as_ref()),
        ] {
            let Some(raw) = raw else { continue };
            let url = Url::parse(raw)
                .map_err(|e| SyncError::InvalidUrl(format!("{} '{}': {}", name, raw, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(SyncError::InvalidUrl(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, raw
                )));
            }
            if url.cannot_be_a_base() {
                return Err(SyncError::InvalidUrl(format!("{} cannot be a base URL: {}", name, raw)));
            }
        }

        for (name, path) in [
            ("review_path", &self.remote.review_path),
            ("catalog_path", &self.remote.catalog_path),
            ("gatekeeper_path", &self.remote.gatekeeper_path),
        ] {
            if !path.starts_with('/') {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must start with '/', got: {}",
                    name, path
                )));
            }
        }

        if self.remote.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MARQUEE_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.remote.base_url = url;
        }

        if let Ok(url) = std::env::var("MARQUEE_SEARCH_URL") {
            debug!(url = %url, "Overriding search URL from environment");
            self.remote.search_url = Some(url);
        }

        if let Ok(timeout) = std::env::var("MARQUEE_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse::<u64>() {
                self.remote.request_timeout_secs = t;
            }
        }

        if let Ok(flag) = std::env::var("MARQUEE_SERIALIZE_RECONCILE") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.catalog.serialize_reconcile = true,
                "0" | "false" | "no" => self.catalog.serialize_reconcile = false,
                _ => warn!(value = %flag, "Unknown MARQUEE_SERIALIZE_RECONCILE value"),
            }
        }

        if let Ok(interval) = std::env::var("MARQUEE_REFRESH_INTERVAL_SECS") {
            if let Ok(i) = interval.parse::<u64>() {
                debug!(interval = i, "Overriding catalog refresh interval from environment");
                self.catalog.refresh_interval_secs = i;
            }
        }

        if let Ok(strategy) = std::env::var("MARQUEE_CLEAR_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => self.gatekeeper.clear_strategy = parsed,
                Err(e) => warn!(error = %e, "Ignoring MARQUEE_CLEAR_STRATEGY"),
            }
        }

        if let Ok(mode) = std::env::var("MARQUEE_DECISION_APPEND") {
            match mode.parse() {
                Ok(parsed) => self.gatekeeper.decision_append = parsed,
                Err(e) => warn!(error = %e, "Ignoring MARQUEE_DECISION_APPEND"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "marquee", "marquee")
            .map(|dirs| dirs.config_dir().join("marquee.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.remote.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.remote.review_path, "/review");
        assert_eq!(config.gatekeeper.clear_strategy, ClearStrategy::Remote);
        assert_eq!(config.gatekeeper.decision_append, DecisionAppend::RequirePending);
        assert!(!config.catalog.serialize_reconcile);
        assert!(config.catalog.refresh_interval().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("remote".parse::<ClearStrategy>().unwrap(), ClearStrategy::Remote);
        assert_eq!("LOCAL".parse::<ClearStrategy>().unwrap(), ClearStrategy::Local);
        assert!("sometimes".parse::<ClearStrategy>().is_err());

        assert_eq!(
            "require-pending".parse::<DecisionAppend>().unwrap(),
            DecisionAppend::RequirePending
        );
        assert_eq!("always".parse::<DecisionAppend>().unwrap(), DecisionAppend::Always);
        assert!("never".parse::<DecisionAppend>().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.remote.base_url = "ws://localhost:8080".to_string();
        assert!(config.validate().is_err());

        config.remote.base_url = "http://localhost:8080".to_string();
        config.remote.search_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        config.remote.search_url = Some("https://search.example.com".to_string());
        assert!(config.validate().is_ok());

        config.remote.catalog_path = "catalog".to_string();
        assert!(config.validate().is_err());

        config.remote.catalog_path = "/catalog".to_string();
        config.remote.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_base_falls_back() {
        let mut settings = RemoteSettings::default();
        assert_eq!(settings.search_base().unwrap(), settings.base().unwrap());

        settings.search_url = Some("http://search.local:9000".to_string());
        assert_eq!(settings.search_base().unwrap().as_str(), "http://search.local:9000/");
    }

    #[test]
    fn test_toml_parsing() {
        let config: SyncConfig = toml::from_str(
            r#"
            [remote]
            base_url = "http://10.0.0.5:8080"

            [catalog]
            refresh_interval_secs = 60

            [gatekeeper]
            clear_strategy = "local"
            decision_append = "always"
            "#,
        )
        .unwrap();

        assert_eq!(config.remote.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.remote.request_timeout_secs, 30);
        assert_eq!(config.catalog.refresh_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.gatekeeper.clear_strategy, ClearStrategy::Local);
        assert_eq!(config.gatekeeper.decision_append, DecisionAppend::Always);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&SyncConfig::default()).unwrap();
        assert!(toml_str.contains("[remote]"));
        assert!(toml_str.contains("[gatekeeper]"));
        assert!(toml_str.contains("clear_strategy = \"remote\""));
    }
}
