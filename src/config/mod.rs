//! Configuration management for notice-sentinel
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Variable names match the existing deployment
//! (`REDIS_CHAN`, `SERVER_NAME`, `START_TARGET_ID`, `SLOT`, ...).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::fetcher::url::{DEFAULT_API_URL, DEFAULT_NOTICE_PAGE_URL};
use crate::fetcher::FetcherConfig;
use crate::publisher::RedisConfig;

/// Default polling period in seconds
pub const DEFAULT_PERIOD_SECS: u32 = 4;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance identity and schedule
    pub instance: InstanceConfig,

    /// Announcements endpoint
    pub fetch: FetchConfig,

    /// Broadcast service
    pub redis: RedisConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Per-instance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Display name carried in every event
    pub server_name: String,

    /// Seconds between polls
    pub period_secs: u32,

    /// Fixed slot; random when absent or out of range
    #[serde(default)]
    pub slot: Option<u32>,

    /// Initial dedup watermark
    #[serde(default)]
    pub start_id: i64,
}

/// Endpoint and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub api_url: String,

    /// Base of the public notice link (`<base>?id=<id>`)
    pub notice_page_url: String,

    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let period_secs = match env_opt("PERIOD_SEC") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("Invalid PERIOD_SEC '{v}'"))?,
            None => DEFAULT_PERIOD_SECS,
        };

        let start_id = match env_opt("START_TARGET_ID") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("Invalid START_TARGET_ID '{v}'"))?,
            None => 0,
        };

        let slot = env_opt("SLOT").and_then(|v| match v.parse::<u32>() {
            Ok(slot) => Some(slot),
            Err(_) => {
                tracing::warn!(value = %v, "Ignoring unparseable SLOT, a random slot will be used");
                None
            }
        });

        let server_name = env_opt("SERVER_NAME").unwrap_or_else(local_hostname);

        let port = match env_opt("REDIS_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("Invalid REDIS_PORT '{v}'"))?,
            None => defaults.redis.port,
        };

        let connect_timeout_ms = env_parse("CONNECT_TIMEOUT_MS")?
            .unwrap_or(defaults.fetch.connect_timeout_ms);
        let read_timeout_ms =
            env_parse("READ_TIMEOUT_MS")?.unwrap_or(defaults.fetch.read_timeout_ms);

        Ok(Self {
            instance: InstanceConfig {
                server_name,
                period_secs,
                slot,
                start_id,
            },
            fetch: FetchConfig {
                api_url: env_opt("NOTICE_API_URL").unwrap_or(defaults.fetch.api_url),
                notice_page_url: env_opt("NOTICE_PAGE_URL")
                    .unwrap_or(defaults.fetch.notice_page_url),
                connect_timeout_ms,
                read_timeout_ms,
            },
            redis: RedisConfig {
                host: env_opt("REDIS_HOST").unwrap_or(defaults.redis.host),
                port,
                password: std::env::var("REDIS_PASS").unwrap_or_default(),
                channel: env_opt("REDIS_CHAN").unwrap_or(defaults.redis.channel),
                pool_size: defaults.redis.pool_size,
            },
            logging: LoggingConfig::from_env(),
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.instance.period_secs == 0 {
            anyhow::bail!("period_secs must be greater than 0");
        }

        if self.instance.server_name.trim().is_empty() {
            anyhow::bail!("server_name must not be empty");
        }

        if self.fetch.api_url.trim().is_empty() {
            anyhow::bail!("api_url must not be empty");
        }

        if self.fetch.connect_timeout_ms == 0 || self.fetch.read_timeout_ms == 0 {
            anyhow::bail!("fetch timeouts must be greater than 0");
        }

        if self.redis.channel.trim().is_empty() {
            anyhow::bail!("redis channel must not be empty");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Settings for [`crate::fetcher::NoticeFetcher`]
    #[must_use]
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            api_url: self.fetch.api_url.clone(),
            connect_timeout: Duration::from_millis(self.fetch.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.fetch.read_timeout_ms),
        }
    }
}

impl LoggingConfig {
    /// `SENTINEL_LOG_LEVEL` and `SENTINEL_LOG_FORMAT`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env_opt("SENTINEL_LOG_LEVEL").unwrap_or(defaults.level),
            format: env_opt("SENTINEL_LOG_FORMAT").unwrap_or(defaults.format),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance: InstanceConfig {
                server_name: local_hostname(),
                period_secs: DEFAULT_PERIOD_SECS,
                slot: None,
                start_id: 0,
            },
            fetch: FetchConfig {
                api_url: DEFAULT_API_URL.to_string(),
                notice_page_url: DEFAULT_NOTICE_PAGE_URL.to_string(),
                connect_timeout_ms: 2000,
                read_timeout_ms: 3000,
            },
            redis: RedisConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse(key: &str) -> Result<Option<u64>> {
    env_opt(key)
        .map(|v| {
            v.parse::<u64>()
                .with_context(|| format!("Invalid {key} '{v}'"))
        })
        .transpose()
}

/// Best-effort local hostname: `HOSTNAME`, then `/etc/hostname`
pub fn local_hostname() -> String {
    env_opt("HOSTNAME")
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| String::from("unknown"))
}
