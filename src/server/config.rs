use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::alerting::scheduler::SchedulerSettings;
use crate::probes::ProbeSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be greater than zero")]
    Invalid(&'static str),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub database_url: String,
    pub sweep_interval_secs: u64,
    pub max_concurrent_probes: usize,
    pub http_timeout_secs: u64,
    pub ping_attempts: u32,
    pub ping_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub due_skew_secs: u64,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialMonitorConfig {
    database_url: Option<String>,
    sweep_interval_secs: Option<u64>,
    max_concurrent_probes: Option<usize>,
    http_timeout_secs: Option<u64>,
    ping_attempts: Option<u32>,
    ping_timeout_secs: Option<u64>,
    notify_timeout_secs: Option<u64>,
    due_skew_secs: Option<u64>,
    log_dir: Option<String>,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn positive<T: PartialEq + Default>(value: T, name: &'static str) -> Result<T, ConfigError> {
    if value == T::default() {
        Err(ConfigError::Invalid(name))
    } else {
        Ok(value)
    }
}

impl MonitorConfig {
    /// Loads `.env`, then the optional TOML file, then the process
    /// environment. Environment values override the file.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(config_path, std::env::vars())
    }

    fn load_from<I>(config_path: Option<&str>, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Io {
                    path: path_str.to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                    path: path_str.to_string(),
                    source,
                })?
            }
            _ => PartialMonitorConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialMonitorConfig = envy::from_iter(env)?;

        // 3. Merge: environment overrides file
        let config = MonitorConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            sweep_interval_secs: env_config.sweep_interval_secs.or(file_config.sweep_interval_secs).unwrap_or(60),
            max_concurrent_probes: env_config.max_concurrent_probes.or(file_config.max_concurrent_probes).unwrap_or(16),
            http_timeout_secs: env_config.http_timeout_secs.or(file_config.http_timeout_secs).unwrap_or(20),
            ping_attempts: env_config.ping_attempts.or(file_config.ping_attempts).unwrap_or(2),
            ping_timeout_secs: env_config.ping_timeout_secs.or(file_config.ping_timeout_secs).unwrap_or(5),
            notify_timeout_secs: env_config.notify_timeout_secs.or(file_config.notify_timeout_secs).unwrap_or(10),
            due_skew_secs: env_config.due_skew_secs.or(file_config.due_skew_secs).unwrap_or(5),
            log_dir: env_config.log_dir.or(file_config.log_dir).unwrap_or_else(default_log_dir),
        };
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        positive(self.sweep_interval_secs, "SWEEP_INTERVAL_SECS")?;
        positive(self.max_concurrent_probes, "MAX_CONCURRENT_PROBES")?;
        positive(self.http_timeout_secs, "HTTP_TIMEOUT_SECS")?;
        positive(self.ping_attempts, "PING_ATTEMPTS")?;
        positive(self.ping_timeout_secs, "PING_TIMEOUT_SECS")?;
        positive(self.notify_timeout_secs, "NOTIFY_TIMEOUT_SECS")?;
        Ok(self)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            ping_attempts: self.ping_attempts,
            ping_timeout: Duration::from_secs(self.ping_timeout_secs),
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            max_concurrent_probes: self.max_concurrent_probes,
            // Skew beyond a day is meaningless for minute-scale intervals.
            due_skew: chrono::Duration::seconds(self.due_skew_secs.min(86_400) as i64),
        }
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}
