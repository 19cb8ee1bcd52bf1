//! # Storefront Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`GEARENT_*`)
//! 2. Config file (`--config <path>`, else `storefront.toml` in the
//!    platform config directory when it exists)
//! 3. Defaults (this file)
//!
//! ## Example `storefront.toml`
//! ```toml
//! api_base_url = "https://api.gearent.kr"
//! api_timeout_secs = 15
//! database_path = "/var/lib/gearent/gearent.db"
//! image_dir = "/var/lib/gearent/images"
//! image_public_url = "https://cdn.gearent.kr"
//! route_cache_ttl_secs = 60
//! log_level = "info"
//! ```
//!
//! Read-only after startup.

use directories::ProjectDirs;
use gearent_core::Money;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "storefront.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// REST backend base URL (without the `/api` suffix).
    pub api_base_url: String,

    pub api_timeout_secs: u64,

    /// Catalog database file.
    pub database_path: PathBuf,

    /// Root directory of the product image bucket.
    pub image_dir: PathBuf,

    /// URL prefix under which `image_dir` is served.
    pub image_public_url: String,

    /// Route cache entry lifetime. `0` keeps entries until revalidated.
    pub route_cache_ttl_secs: u64,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,

    pub currency_symbol: String,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("kr", "gearent", "storefront")
}

impl Default for StorefrontConfig {
    /// Development defaults: local backend, data in the platform data dir.
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        StorefrontConfig {
            api_base_url: "http://localhost:4000".to_string(),
            api_timeout_secs: 10,
            database_path: data_dir.join("gearent.db"),
            image_dir: data_dir.join("images"),
            image_public_url: "http://localhost:4000/images".to_string(),
            route_cache_ttl_secs: 0,
            log_level: "info".to_string(),
            currency_symbol: "₩".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Loads file, then environment, then validates.
    ///
    /// An explicit `path` must exist; the platform default is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => StorefrontConfig::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            api = %config.api_base_url,
            db = %config.database_path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// `storefront.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Reading config file");
        Self::from_toml(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Overrides fields from `GEARENT_*` variables.
    ///
    /// ## Environment Variables
    /// - `GEARENT_API_URL`
    /// - `GEARENT_API_TIMEOUT_SECS`
    /// - `GEARENT_DB_PATH`
    /// - `GEARENT_IMAGE_DIR`
    /// - `GEARENT_IMAGE_PUBLIC_URL`
    /// - `GEARENT_CACHE_TTL_SECS`
    /// - `GEARENT_LOG_LEVEL`
    /// - `GEARENT_CURRENCY_SYMBOL`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        fn seconds(key: &str, value: String) -> Result<u64, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        }

        if let Some(url) = var("GEARENT_API_URL") {
            self.api_base_url = url;
        }
        if let Some(value) = var("GEARENT_API_TIMEOUT_SECS") {
            self.api_timeout_secs = seconds("GEARENT_API_TIMEOUT_SECS", value)?;
        }
        if let Some(path) = var("GEARENT_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = var("GEARENT_IMAGE_DIR") {
            self.image_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("GEARENT_IMAGE_PUBLIC_URL") {
            self.image_public_url = url;
        }
        if let Some(value) = var("GEARENT_CACHE_TTL_SECS") {
            self.route_cache_ttl_secs = seconds("GEARENT_CACHE_TTL_SECS", value)?;
        }
        if let Some(level) = var("GEARENT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(symbol) = var("GEARENT_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must start with http:// or https://, got {url}"
            )));
        }
        if self.api_timeout_secs == 0 {
            return Err(ConfigError::Invalid("api_timeout_secs must be positive".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path is empty".into()));
        }
        if self.image_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("image_dir is empty".into()));
        }
        if self.image_public_url.trim().is_empty() {
            return Err(ConfigError::Invalid("image_public_url is empty".into()));
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn route_cache_ttl(&self) -> Option<Duration> {
        (self.route_cache_ttl_secs > 0).then(|| Duration::from_secs(self.route_cache_ttl_secs))
    }

    /// Formats a price for display, e.g. `₩50,000`.
    pub fn format_price(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}
