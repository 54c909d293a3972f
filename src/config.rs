use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub cache: CacheConfig,

    pub search: SearchConfig,

    pub popular: PopularConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `pretty` or `json`
    pub log_format: String,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    /// Tokio worker threads; 0 uses the runtime default.
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/pocketnavi.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            max_db_connections: 5,
            min_db_connections: 1,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding both the per-query and the popular-search caches.
    pub root: PathBuf,

    pub enabled: bool,

    pub result_ttl_seconds: u64,

    pub popular_ttl_seconds: u64,

    /// Wait before re-checking the popular cache when another rebuild holds
    /// the lock.
    pub lock_retry_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("cache"),
            enabled: true,
            result_ttl_seconds: 3600,
            popular_ttl_seconds: 1800,
            lock_retry_ms: 100,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_seconds)
    }

    #[must_use]
    pub const fn popular_ttl(&self) -> Duration {
        Duration::from_secs(self.popular_ttl_seconds)
    }

    #[must_use]
    pub const fn lock_retry(&self) -> Duration {
        Duration::from_millis(self.lock_retry_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: u64,

    pub max_limit: u64,

    pub default_radius_km: f64,

    /// Base URL photos are served from; thumbnails are
    /// `{photo_base_url}/{uid}/{file}`.
    pub photo_base_url: String,

    /// Record free-text searches for the popular-search view.
    pub log_queries: bool,

    pub duplicate_window_minutes: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            default_radius_km: 5.0,
            photo_base_url: "https://kenchikuka.com/pictures".to_string(),
            log_queries: true,
            duplicate_window_minutes: 5,
        }
    }
}

impl SearchConfig {
    /// Normalizes a requested page and limit: page starts at 1, a zero limit
    /// means the default, and limits are capped at `max_limit`.
    #[must_use]
    pub fn clamp_page(&self, page: u64, limit: u64) -> (u64, u64) {
        let limit = if limit == 0 { self.default_limit } else { limit };
        (page.max(1), limit.min(self.max_limit))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularConfig {
    /// Only searches from the last `window_days` days are counted.
    pub window_days: i64,

    pub min_searches: u64,

    pub default_limit: u64,
}

impl Default for PopularConfig {
    fn default() -> Self {
        Self {
            window_days: 5,
            min_searches: 2,
            default_limit: 20,
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
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pocketnavi").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pocketnavi").join("config.toml"));
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
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            anyhow::bail!("Search limits must be > 0");
        }

        if self.search.default_limit > self.search.max_limit {
            anyhow::bail!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit,
                self.search.max_limit
            );
        }

        if !(self.search.default_radius_km.is_finite() && self.search.default_radius_km > 0.0) {
            anyhow::bail!("search.default_radius_km must be > 0");
        }

        if self.popular.default_limit == 0 {
            anyhow::bail!("popular.default_limit must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "Unknown log_format '{}' (expected 'pretty' or 'json')",
                self.general.log_format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.cache.result_ttl_seconds, 3600);
        assert_eq!(config.popular.window_days, 5);
        assert_eq!(config.popular.min_searches, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[search]"));
        assert!(toml_str.contains("[popular]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [cache]
            enabled = false
            result_ttl_seconds = 60
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.result_ttl(), Duration::from_secs(60));

        assert_eq!(config.search.max_limit, 100);
    }

    #[test]
    fn test_validation_rejects_inverted_limits() {
        let mut config = Config::default();
        config.search.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_page() {
        let search = SearchConfig::default();
        assert_eq!(search.clamp_page(0, 0), (1, 10));
        assert_eq!(search.clamp_page(3, 1000), (3, 100));
    }
}
