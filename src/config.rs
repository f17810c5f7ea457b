// src/config.rs - Configuration management
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub data: DataConfig,
    pub dev_login: DevLoginConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// IANA zone name sent as `X-Timezone` on every request.
    pub timezone: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub login_path: String,
    pub refresh_path: String,
    /// Where the CLI keeps access/refresh tokens between runs.
    pub token_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DataConfig {
    pub use_mocks: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DevLoginConfig {
    pub enabled: bool,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timezone: "UTC".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            token_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_config()
    }

    /// Config pointed at `base_url` with every other setting at its default.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Config::default();
        config.api.base_url = base_url.into();
        config
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(anyhow::anyhow!("API base URL must not be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https:// (got '{}')",
                base_url
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }

        if !self.session.login_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "login_path must start with '/' (got '{}')",
                self.session.login_path
            ));
        }
        if !self.session.refresh_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "refresh_path must start with '/' (got '{}')",
                self.session.refresh_path
            ));
        }

        let has_secret = self
            .dev_login
            .secret
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if self.dev_login.enabled && !has_secret {
            return Err(anyhow::anyhow!(
                "ALLOW_DEV_LOGIN is set but DEV_LOGIN_SECRET is missing"
            ));
        }

        Ok(())
    }

    pub fn print_startup_info(&self) {
        log::info!("🧪 Lab dashboard client starting up...");
        log::info!("🌐 Backend: {}", self.api.base_url);
        log::info!("🕒 Timezone: {}", self.api.timezone);
        log::info!("⏱️  Request timeout: {}s", self.api.request_timeout_secs);
        log::info!("📊 Logging: {} level", self.logging.level);

        if self.data.use_mocks {
            log::warn!("🚧 Mock data mode: no backend calls will be made");
        }
        if self.dev_login.enabled {
            log::warn!("🔑 Dev login enabled");
        }
        if self.api.base_url.starts_with("http://") && !self.api.base_url.contains("127.0.0.1")
            && !self.api.base_url.contains("localhost")
        {
            log::warn!("⚠️  Backend is reached over plain HTTP");
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        read_config_file(Path::new(&config_file))?
    } else {
        Config::default()
    };

    apply_overrides(&mut config, |key| env::var(key).ok());

    config.validate().context("Configuration validation failed")?;

    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Applies environment-style overrides from `lookup`.
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("LABDASH_API_BASE_URL").or_else(|| lookup("NEXT_PUBLIC_API_BASE_URL")) {
        let url = url.trim().trim_end_matches('/').to_string();
        if !url.is_empty() {
            config.api.base_url = url;
        }
    }
    if let Some(tz) = lookup("LABDASH_TIMEZONE").or_else(|| lookup("TZ")) {
        if !tz.trim().is_empty() {
            config.api.timezone = tz.trim().to_string();
        }
    }
    if let Some(timeout_str) = lookup("LABDASH_REQUEST_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout_str.trim().parse::<u64>() {
            config.api.request_timeout_secs = timeout;
        }
    }
    if let Some(mocks) = lookup("LABDASH_USE_MOCKS") {
        config.data.use_mocks = parse_flag(&mocks);
    }
    if let Some(token_file) = lookup("LABDASH_TOKEN_FILE") {
        config.session.token_file = Some(token_file);
    }
    if let Some(allow) = lookup("ALLOW_DEV_LOGIN") {
        config.dev_login.enabled = parse_flag(&allow);
    }
    if let Some(secret) = lookup("DEV_LOGIN_SECRET") {
        config.dev_login.secret = Some(secret);
    }
    if let Some(level) = lookup("RUST_LOG") {
        config.logging.level = level;
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}
