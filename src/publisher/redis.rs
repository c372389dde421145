//! Redis pub/sub publisher
//!
//! # Example
//!
//! ```rust,ignore
//! use notice_sentinel::publisher::{Publisher, RedisConfig, RedisPublisher};
//!
//! let publisher = RedisPublisher::connect(&RedisConfig::default()).await?;
//! let subscribers = publisher.publish(&event).await?;
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use super::{encode_event, Publisher, DEFAULT_CHANNEL};
use crate::models::Event;
use crate::utils::error::PublishError;

/// Broadcast service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,

    /// Empty means no AUTH
    #[serde(default)]
    pub password: String,

    pub channel: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    2
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: String::new(),
            channel: DEFAULT_CHANNEL.to_string(),
            pool_size: default_pool_size(),
        }
    }
}

impl RedisConfig {
    /// Connection URL with the password percent-encoded
    pub fn url(&self) -> Result<String> {
        let mut url = url::Url::parse(&format!("redis://{}:{}", self.host, self.port))
            .with_context(|| format!("Invalid Redis address {}:{}", self.host, self.port))?;

        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| anyhow::anyhow!("Cannot set Redis password on {url}"))?;
        }

        Ok(url.to_string())
    }

    /// Same URL with the password masked, for logs
    pub fn display_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}", self.host, self.port)
        } else {
            format!("redis://:***@{}:{}", self.host, self.port)
        }
    }
}

/// Publishes events with Redis `PUBLISH`
pub struct RedisPublisher {
    pool: Pool,
    channel: String,
}

impl RedisPublisher {
    /// Build the pool and verify the server answers `PING`
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let pool_config = PoolConfig::from_url(config.url()?);
        let pool = pool_config
            .builder()
            .map_err(|e| anyhow::anyhow!("Failed to create pool builder: {e}"))?
            .max_size(config.pool_size.max(1))
            .runtime(Runtime::Tokio1)
            .build()
            .context("Failed to create Redis connection pool")?;

        let mut conn = pool.get().await.context("Failed to get Redis connection")?;

        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .context("Failed to ping Redis")?;

        tracing::info!(url = %config.display_url(), channel = %config.channel, "Connected to Redis");

        Ok(Self {
            pool,
            channel: config.channel.clone(),
        })
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn publish(&self, event: &Event) -> Result<u64, PublishError> {
        let payload = encode_event(event)?;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| PublishError::Pool(e.to_string()))?;

        let receivers: i64 = conn.publish(&self.channel, payload).await?;

        Ok(receivers.max(0) as u64)
    }
}
