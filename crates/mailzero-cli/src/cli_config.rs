use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mailzero_core::Settings;
use mailzero_mail::{Credentials, DEFAULT_TIMEOUT, DriverConfig, OAuthClient};
use serde::Deserialize;
use tracing::debug;

const CONFIG_ENV: &str = "MAILZERO_CONFIG";
const ACCESS_TOKEN_ENV: &str = "MAILZERO_ACCESS_TOKEN";
const REFRESH_TOKEN_ENV: &str = "MAILZERO_REFRESH_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) provider: String,
    pub(crate) auth: Credentials,
    pub(crate) account: AccountConfig,
    pub(crate) settings: Settings,
    pub(crate) http: HttpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            auth: Credentials::default(),
            account: AccountConfig::default(),
            settings: Settings::default(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AccountConfig {
    /// Sender address used by `send`.
    pub(crate) address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct HttpConfig {
    pub(crate) timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl AppConfig {
    pub(crate) fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("invalid mailzero.toml")?;
        config.settings.validate().context("invalid [settings]")?;
        Ok(config)
    }

    pub(crate) fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(token) = non_empty(ACCESS_TOKEN_ENV) {
            self.auth.access_token = token;
        }
        if let Some(token) = non_empty(REFRESH_TOKEN_ENV) {
            self.auth.refresh_token = token;
        }
    }

    pub(crate) fn driver_config(&self) -> DriverConfig {
        let mut config = DriverConfig::new(self.auth.clone());
        config.oauth_client = OAuthClient::from_env();
        config.timeout = Duration::from_secs(self.http.timeout_secs.max(1));
        config
    }
}

fn xdg_config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

fn config_path_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        paths.push(PathBuf::from(path));
    }
    paths.push(xdg_config_dir().join("mailzero").join("mailzero.toml"));
    paths
}

/// First readable candidate wins; no file at all means defaults.
pub(crate) fn load_config() -> Result<AppConfig> {
    let mut config = AppConfig::default();
    for path in config_path_candidates() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            debug!("loading config from {}", path.display());
            config = AppConfig::parse(&content)
                .with_context(|| format!("failed to load {}", path.display()))?;
            break;
        }
    }
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}
