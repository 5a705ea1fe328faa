use crate::{AppConfig, ConfigError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const ORG: &str = "io";
const AUTHOR: &str = "InboxGenie";
const APP: &str = "InboxGenie";

/// Overrides `api.base_url` for the running process.
pub const API_BASE_URL_ENV: &str = "INBOXGENIE_API_BASE_URL";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from(ORG, AUTHOR, APP).ok_or(ConfigError::MissingDirectories)?;
        Self::at(dirs.config_dir().join("config.toml"))
    }

    /// Uses an explicit config file, writing defaults when it does not exist yet.
    pub fn at(config_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = config_path.into();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let initial = AppConfig::default();
            let content = toml::to_string_pretty(&initial)?;
            fs::write(&config_path, content)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
        }

        Ok(Self { config_path })
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let content = fs::read_to_string(&self.config_path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        apply_env_overrides(&mut config, std::env::var(API_BASE_URL_ENV).ok());
        config.api_base_url()?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config.api_base_url()?;
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

pub fn apply_env_overrides(config: &mut AppConfig, base_url: Option<String>) {
    if let Some(base_url) = base_url.filter(|value| !value.trim().is_empty()) {
        tracing::debug!(%base_url, "api base url overridden from environment");
        config.api.base_url = base_url.trim().to_string();
    }
}
