use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::clients::governor::PacingConfig;
use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub providers: ProviderConfig,

    pub guide: GuideConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Minimum spacing between calls to the same provider.
    pub min_interval_ms: u64,

    /// Cooldown after a provider's own rate-limit signal.
    pub throttle_hold_ms: u64,

    /// Base for the exponential retry backoff.
    pub retry_base_ms: u64,

    pub max_retries: u32,

    /// Raw-response cache TTL. Built guides are cached separately and
    /// never expire.
    pub response_cache_ttl_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            min_interval_ms: constants::pacing::MIN_PROVIDER_INTERVAL.as_millis() as u64,
            throttle_hold_ms: constants::pacing::THROTTLE_HOLD.as_millis() as u64,
            retry_base_ms: constants::pacing::RETRY_BASE.as_millis() as u64,
            max_retries: constants::pacing::MAX_RETRIES,
            response_cache_ttl_seconds: constants::cache::RESPONSE_TTL.as_secs(),
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub const fn pacing(&self) -> PacingConfig {
        PacingConfig {
            min_interval: Duration::from_millis(self.min_interval_ms),
            throttle_hold: Duration::from_millis(self.throttle_hold_ms),
            retry_base: Duration::from_millis(self.retry_base_ms),
            max_retries: self.max_retries,
        }
    }

    #[must_use]
    pub const fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_cache_ttl_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Assumed runtime of one episode when no provider supplies one.
    pub episode_duration_minutes: u32,

    /// Fetch per-episode synopses through the detail endpoint. Off by
    /// default: it costs one governed call per episode.
    pub fetch_synopses: bool,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            episode_duration_minutes: constants::guide::DEFAULT_EPISODE_DURATION_MINUTES,
            fetch_synopses: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("skiparr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".skiparr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port must be set when the server is enabled");
        }

        if self.guide.episode_duration_minutes == 0 {
            anyhow::bail!("Episode duration must be > 0 minutes");
        }

        if self.providers.min_interval_ms == 0 {
            anyhow::bail!("Provider pacing interval must be > 0 ms");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn pacing_translates_from_millis() {
        let pacing = ProviderConfig::default().pacing();
        assert_eq!(pacing.min_interval, Duration::from_millis(1000));
        assert_eq!(pacing.throttle_hold, Duration::from_millis(5000));
        assert_eq!(pacing.retry_base, Duration::from_millis(2000));
        assert_eq!(pacing.max_retries, 2);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut config = Config::default();
        config.guide.episode_duration_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [guide]
            episode_duration_minutes = 23
            "#,
        )
        .unwrap();

        assert_eq!(config.guide.episode_duration_minutes, 23);
        assert_eq!(config.providers.max_retries, 2);
        assert!(config.server.enabled);
    }
}
