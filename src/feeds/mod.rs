// src/feeds/mod.rs
pub mod parse;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::model::NewsCandidate;

/// One-time metrics registration for the feed pipeline.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from feed sources.");
        describe_counter!(
            "feed_fetch_errors_total",
            "Feed sources that failed to fetch or parse."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Fetches N feed sources concurrently and turns them into candidates.
///
/// A failing source contributes zero candidates and never fails the
/// aggregate; results are reassembled in source-list order so selection stays
/// deterministic for identical feed content.
pub struct FeedAggregator {
    http: reqwest::Client,
    max_entries_per_source: usize,
}

impl FeedAggregator {
    pub fn new(request_timeout: Duration, max_entries_per_source: usize) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("tg-auto-channels/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(request_timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            max_entries_per_source,
        }
    }

    pub async fn collect(
        &self,
        sources: &[String],
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Vec<NewsCandidate> {
        ensure_metrics_described();

        let mut handles = Vec::with_capacity(sources.len());
        for url in sources {
            let http = self.http.clone();
            let url = url.clone();
            let cap = self.max_entries_per_source;
            handles.push(tokio::spawn(async move {
                fetch_one(&http, &url, cutoff, now, cap).await
            }));
        }

        let mut candidates = Vec::new();
        for (url, handle) in sources.iter().zip(handles) {
            match handle.await {
                Ok(Ok(mut items)) => candidates.append(&mut items),
                Ok(Err(e)) => {
                    tracing::warn!(error = ?e, source = %url, "feed source failed");
                    counter!("feed_fetch_errors_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, source = %url, "feed fetch task aborted");
                    counter!("feed_fetch_errors_total").increment(1);
                }
            }
        }
        candidates
    }
}

async fn fetch_one(
    http: &reqwest::Client,
    url: &str,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
    max_entries: usize,
) -> Result<Vec<NewsCandidate>> {
    let response = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching feed {url}"))?
        .error_for_status()
        .with_context(|| format!("feed {url} returned an error status"))?;
    let body = response
        .text()
        .await
        .with_context(|| format!("reading feed body from {url}"))?;
    parse::parse_feed(&body, url, cutoff, now, max_entries)
}
