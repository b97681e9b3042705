//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with SHAREHUB_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets (DATABASE_URL, SECRET_KEY, SALT, SMTP credentials) stay in
//! environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "ShareHub".to_string(),
            description: "A community donation-matching service".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where uploaded donation photos are written.
    pub uploads_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_path: "uploads".to_string(),
        }
    }
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in MB
    pub max_upload_size_mb: u32,
    /// Maximum title length for donations and requests
    pub max_title_length: u32,
    /// Maximum description length for donations and requests
    pub max_description_length: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 10,
            max_title_length: 100,
            max_description_length: 500,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., SHAREHUB_SITE_NAME, SHAREHUB_STORAGE_UPLOADS_PATH
            .add_source(
                Environment::with_prefix("SHAREHUB")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// Triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = APP_CONFIG.read().unwrap();
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get site configuration
pub fn site() -> SiteConfig {
    get_config().site
}

/// Get storage configuration
pub fn storage() -> StorageConfig {
    get_config().storage
}

/// Get limits configuration
pub fn limits() -> LimitsConfig {
    get_config().limits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.site.name, "ShareHub");
        assert_eq!(config.storage.uploads_path, "uploads");
        assert_eq!(config.limits.max_upload_size_mb, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[site]\nname = \"Test Shop\"\n\n[storage]\nuploads_path = \"/tmp/test-uploads\"\n"
        )
        .expect("write config");

        let config = AppConfig::load_from_path(file.path().to_str().unwrap()).expect("load");
        assert_eq!(config.site.name, "Test Shop");
        assert_eq!(config.storage.uploads_path, "/tmp/test-uploads");
        // Unspecified sections keep their defaults.
        assert_eq!(config.limits.max_title_length, 100);
    }
}
