use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

const APP_DIR: &str = "blog-notifier";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Root of the blog REST API; endpoint paths are resolved against it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_user")]
    pub api_username: String,

    #[serde(default = "default_api_user")]
    pub api_password: String,

    /// Without a token notifications are only logged.
    pub telegram_token: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,

    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Gives the blog API time to come up when both start together.
    #[serde(default)]
    pub startup_delay_secs: u64,

    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_latest_native_path")]
    pub latest_native: String,
    #[serde(default = "default_latest_scraped_path")]
    pub latest_scraped: String,
    #[serde(default = "default_articles_path")]
    pub articles: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("notifier.db").to_string_lossy().to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_api_user() -> String {
    "botuser".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_retry_backoff() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_login_path() -> String {
    "login/".to_string()
}

fn default_latest_native_path() -> String {
    "latest/".to_string()
}

fn default_latest_scraped_path() -> String {
    "latest-scraped/".to_string()
}

fn default_articles_path() -> String {
    "articles/".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: default_login_path(),
            latest_native: default_latest_native_path(),
            latest_scraped: default_latest_scraped_path(),
            articles: default_articles_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_base_url: default_api_base_url(),
            api_username: default_api_user(),
            api_password: default_api_user(),
            telegram_token: None,
            poll_interval_minutes: default_poll_interval(),
            retry_backoff_secs: default_retry_backoff(),
            request_timeout_secs: default_request_timeout(),
            startup_delay_secs: 0,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Loads the config file (writing defaults when it does not exist yet),
    /// then applies environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Environment variables used by the docker deployment of the bot.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|t| !t.is_empty()) {
            self.telegram_token = Some(token);
        }
        if let Some(url) = lookup("API_BASE_URL").filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(db) = lookup("DB_NAME").filter(|d| !d.is_empty()) {
            self.db_path = db;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_base_url).map_err(|e| {
            AppError::Config(format!("invalid api_base_url {:?}: {}", self.api_base_url, e))
        })?;
        if self.poll_interval_minutes == 0 {
            return Err(AppError::Config(
                "poll_interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes * 60)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
