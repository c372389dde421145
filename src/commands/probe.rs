use anyhow::{Context, Result};
use std::sync::Arc;

use notice_sentinel::config::Config;
use notice_sentinel::fetcher::headers::RandomHeaderProvider;
use notice_sentinel::fetcher::NoticeFetcher;
use notice_sentinel::metrics;
use notice_sentinel::scheduler::SystemClock;
use notice_sentinel::ticker::extract_ticker;

/// One request against the configured endpoint, printed as JSON
pub async fn probe(config: Config, show_metrics: bool) -> Result<()> {
    config.validate()?;

    if show_metrics {
        metrics::init_metrics().map_err(|e| anyhow::anyhow!("Failed to init metrics: {e}"))?;
    }

    let fetcher = NoticeFetcher::new(
        &config.fetcher_config(),
        Arc::new(RandomHeaderProvider),
        Arc::new(SystemClock),
    )
    .context("Failed to create fetcher")?;

    let result = fetcher.poll().await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(notice) = &result.top_notice {
        println!("ticker: {}", extract_ticker(&notice.title));
    }

    if show_metrics {
        let encoded =
            metrics::encode_metrics().map_err(|e| anyhow::anyhow!("Failed to encode metrics: {e}"))?;
        println!();
        print!("{encoded}");
    }

    Ok(())
}

pub fn ticker(title: &str) {
    println!("{}", extract_ticker(title));
}
