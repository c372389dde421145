use anyhow::{Context, Result};
use std::sync::Arc;

use notice_sentinel::config::Config;
use notice_sentinel::metrics;
use notice_sentinel::models::DedupWatermark;
use notice_sentinel::publisher::{BroadcastPublisher, Publisher, RedisPublisher};
use notice_sentinel::scheduler::SystemClock;
use notice_sentinel::watcher::NoticeWatcher;

/// Command-line values that take precedence over the configuration
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub slot: Option<u32>,
    pub period: Option<u32>,
    pub start_id: Option<i64>,
    pub dry_run: bool,
}

pub async fn run(mut config: Config, overrides: RunOverrides) -> Result<()> {
    if let Some(slot) = overrides.slot {
        config.instance.slot = Some(slot);
    }
    if let Some(period) = overrides.period {
        config.instance.period_secs = period;
    }
    if let Some(start_id) = overrides.start_id {
        config.instance.start_id = start_id;
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let publisher: Arc<dyn Publisher> = if overrides.dry_run {
        tracing::info!(channel = %config.redis.channel, "Dry run, events stay in-process");
        Arc::new(BroadcastPublisher::new(config.redis.channel.clone()))
    } else {
        let publisher = RedisPublisher::connect(&config.redis)
            .await
            .with_context(|| format!("Cannot reach Redis at {}", config.redis.display_url()))?;
        Arc::new(publisher)
    };

    let watcher = NoticeWatcher::from_config(&config, publisher, Arc::new(SystemClock))
        .inspect_err(|e| {
            tracing::error!(
                error = %e,
                category = ?e.category(),
                recoverable = e.is_recoverable(),
                "Watcher startup failed"
            );
        })?;
    let watermark = DedupWatermark::new(config.instance.start_id);

    tokio::select! {
        result = watcher.run(config.instance.period_secs, watermark) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
