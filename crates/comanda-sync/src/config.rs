//! # Station Configuration
//!
//! Configuration for one display station (kitchen or cashier).
//!
//! ## Configuration File Format
//! ```toml
//! # station.toml
//! [station]
//! id = "550e8400-e29b-41d4-a716-446655440000"   # generated on first run
//! name = "Caja 1"
//!
//! [channel]
//! url = "ws://localhost:3000/channel"
//! connect_timeout_secs = 10
//! initial_backoff_ms = 500
//! max_backoff_secs = 60
//! ping_interval_secs = 30
//!
//! [service]
//! url = "http://localhost:3000"
//! timeout_secs = 10
//!
//! [tables]
//! count = 19
//! ```
//!
//! The file lives in the platform config directory
//! (`~/.config/comanda/station.toml` on Linux). A missing file yields
//! defaults with a freshly generated station id, persisted back on a
//! best-effort basis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};
use crate::transport::TransportConfig;

// =============================================================================
// Sections
// =============================================================================

/// Station identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSection {
    /// Stable station id, generated locally without coordination.
    pub id: String,

    /// Human-readable name ("Cocina", "Caja 1").
    pub name: String,
}

/// Push channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSection {
    /// WebSocket URL of the push channel.
    pub url: String,

    #[serde(default = "defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "defaults::initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "defaults::max_backoff_secs")]
    pub max_backoff_secs: u64,

    #[serde(default = "defaults::ping_interval_secs")]
    pub ping_interval_secs: u64,
}

/// Settlement service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    /// Base URL of the settlement/catalog service.
    pub url: String,

    #[serde(default = "defaults::service_timeout_secs")]
    pub timeout_secs: u64,
}

/// Table grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesSection {
    /// Fixed cardinality of the cashier grid.
    #[serde(default = "defaults::table_count")]
    pub count: u32,
}

mod defaults {
    pub fn connect_timeout_secs() -> u64 {
        10
    }
    pub fn initial_backoff_ms() -> u64 {
        500
    }
    pub fn max_backoff_secs() -> u64 {
        60
    }
    pub fn ping_interval_secs() -> u64 {
        30
    }
    pub fn service_timeout_secs() -> u64 {
        10
    }
    pub fn table_count() -> u32 {
        comanda_core::DEFAULT_TABLE_COUNT
    }
}

// =============================================================================
// Station Config
// =============================================================================

/// Full configuration of one station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub station: StationSection,
    pub channel: ChannelSection,
    pub service: ServiceSection,
    pub tables: TablesSection,
}

impl StationConfig {
    /// Builds a default configuration with a fresh station id.
    pub fn generate(station_name: &str) -> Self {
        StationConfig {
            station: StationSection {
                id: Uuid::new_v4().to_string(),
                name: station_name.to_string(),
            },
            channel: ChannelSection {
                url: "ws://localhost:3000/channel".to_string(),
                connect_timeout_secs: defaults::connect_timeout_secs(),
                initial_backoff_ms: defaults::initial_backoff_ms(),
                max_backoff_secs: defaults::max_backoff_secs(),
                ping_interval_secs: defaults::ping_interval_secs(),
            },
            service: ServiceSection {
                url: "http://localhost:3000".to_string(),
                timeout_secs: defaults::service_timeout_secs(),
            },
            tables: TablesSection {
                count: defaults::table_count(),
            },
        }
    }

    /// Default path of the config file in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "comanda")
            .map(|dirs| dirs.config_dir().join("station.toml"))
    }

    /// Loads the config from `path` (or the default location),
    /// falling back to generated defaults when the file is absent.
    ///
    /// A freshly generated config is persisted back so the station id
    /// stays stable across restarts; a save failure only warns.
    pub fn load_or_default(path: Option<PathBuf>, station_name: &str) -> SyncResult<Self> {
        let path = match path.or_else(Self::default_path) {
            Some(p) => p,
            None => {
                warn!("no config directory available; using in-memory defaults");
                return Ok(Self::generate(station_name));
            }
        };

        if path.exists() {
            debug!(path = %path.display(), "loading station config");
            let raw = std::fs::read_to_string(&path)?;
            let config: StationConfig = toml::from_str(&raw)?;
            config.validate()?;
            return Ok(config);
        }

        info!(path = %path.display(), "no config file; generating defaults");
        let config = Self::generate(station_name);
        if let Err(e) = config.save(&path) {
            warn!(error = %e, "could not persist generated config");
        }
        Ok(config)
    }

    /// Persists the config as TOML.
    pub fn save(&self, path: &PathBuf) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Checks the parts that no amount of retrying will fix.
    pub fn validate(&self) -> SyncResult<()> {
        url::Url::parse(&self.channel.url)?;
        url::Url::parse(&self.service.url)?;
        if self.tables.count == 0 {
            return Err(SyncError::InvalidConfig(
                "tables.count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Transport settings derived from the channel section.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.channel.url.clone(),
            connect_timeout: Duration::from_secs(self.channel.connect_timeout_secs),
            initial_backoff: Duration::from_millis(self.channel.initial_backoff_ms),
            max_backoff: Duration::from_secs(self.channel.max_backoff_secs),
            max_retries: 0,
            ping_interval: Duration::from_secs(self.channel.ping_interval_secs),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_fresh_id_and_defaults() {
        let a = StationConfig::generate("Cocina");
        let b = StationConfig::generate("Cocina");

        assert_ne!(a.station.id, b.station.id);
        assert_eq!(a.tables.count, comanda_core::DEFAULT_TABLE_COUNT);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_with_partial_sections() {
        let raw = r#"
            [station]
            id = "abc"
            name = "Caja 1"

            [channel]
            url = "ws://10.0.0.5:3000/channel"

            [service]
            url = "http://10.0.0.5:3000"

            [tables]
            count = 12
        "#;

        let config: StationConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.station.name, "Caja 1");
        assert_eq!(config.tables.count, 12);
        // Omitted knobs take defaults
        assert_eq!(config.channel.ping_interval_secs, 30);

        let transport = config.transport_config();
        assert_eq!(transport.url, "ws://10.0.0.5:3000/channel");
        assert_eq!(transport.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_bad_urls_and_zero_tables() {
        let mut config = StationConfig::generate("x");
        config.channel.url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = StationConfig::generate("x");
        config.tables.count = 0;
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfig(_))
        ));
    }
}
