use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Loaded from the platform config dir, with sensible defaults when the
/// file is missing. CLI flags override individual fields at the call site.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load config from default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?
            .join("quotevault");
        Ok(config_dir.join("config.toml"))
    }

    /// Where the quote database lives: configured override, or the
    /// platform data dir.
    pub fn data_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::Config("Could not find data directory".into()))?
            .join("quotevault");
        Ok(data_dir.join("quotes.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the mock REST endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whether periodic sync runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Mirror locally added quotes to the write endpoint
    #[serde(default)]
    pub mirror_writes: bool,

    /// Cap on how many remote records one fetch pulls in
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

fn default_base_url() -> String {
    quotevault_remote::DEFAULT_BASE_URL.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_fetch_limit() -> usize {
    10 // the mock endpoint has 100 posts; nobody wants all of them
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            enabled: default_enabled(),
            mirror_writes: false,
            fetch_limit: default_fetch_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between sync ticks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_interval() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Override for the quote database path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert!(config.remote.enabled);
        assert!(!config.remote.mirror_writes);
        assert_eq!(config.sync.interval_secs, 30);
        assert_eq!(config.remote.fetch_limit, 10);
        assert!(config.remote.base_url.starts_with("https://"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.sync.interval_secs, config.sync.interval_secs);
        assert_eq!(parsed.remote.base_url, config.remote.base_url);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: Config = toml::from_str("[sync]\ninterval_secs = 5\n").unwrap();
        assert_eq!(parsed.sync.interval_secs, 5);
        assert!(parsed.remote.enabled);
        assert_eq!(parsed.remote.base_url, default_base_url());
    }

    #[test]
    fn data_path_override_wins() {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/tmp/custom.db"));
    }
}
