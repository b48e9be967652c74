// src/posting/scheduler.rs
// The periodic tick: one pass over all auto-posting channels, sequential so
// ticks never overlap and deliveries to the shared transport stay ordered.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::posting::policy::PostingPolicy;
use crate::posting::service::{PostOutcome, PostingService};
use crate::store::ChannelStore;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("posting_ticks_total", "Completed scheduler ticks.");
        describe_counter!("posting_sent_total", "Posts delivered successfully.");
        describe_counter!("posting_skipped_total", "Runs that produced no content.");
        describe_counter!(
            "posting_failed_total",
            "Channel runs that ended in an error."
        );
        describe_gauge!("posting_last_tick_ts", "Unix ts of the last tick.");
    });
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub evaluated: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct SchedulerService {
    channels: Arc<dyn ChannelStore>,
    policy: PostingPolicy,
    posting: PostingService,
}

impl SchedulerService {
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        policy: PostingPolicy,
        posting: PostingService,
    ) -> Self {
        Self {
            channels,
            policy,
            posting,
        }
    }

    /// One full channel sweep. Per-channel errors are logged and counted;
    /// they never abort the tick or skip the remaining channels.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickSummary {
        ensure_metrics_described();
        let mut summary = TickSummary::default();

        let channels = match self.channels.list_auto_posting().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = ?e, "listing channels failed, skipping tick");
                return summary;
            }
        };

        for channel in &channels {
            summary.evaluated += 1;

            let eligible = match self.policy.should_post(channel, now).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = ?e, channel = %channel.internal_name, "policy evaluation failed");
                    counter!("posting_failed_total").increment(1);
                    summary.failed += 1;
                    continue;
                }
            };
            if !eligible {
                continue;
            }

            match self.posting.create_and_send_post(channel, now).await {
                Ok(PostOutcome::Sent) => {
                    counter!("posting_sent_total").increment(1);
                    summary.sent += 1;
                }
                Ok(PostOutcome::Skipped) => {
                    counter!("posting_skipped_total").increment(1);
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, channel = %channel.internal_name, "posting run failed");
                    counter!("posting_failed_total").increment(1);
                    summary.failed += 1;
                }
            }
        }

        counter!("posting_ticks_total").increment(1);
        gauge!("posting_last_tick_ts").set(now.timestamp().max(0) as f64);
        summary
    }
}

/// Spawn the periodic loop. Ticks run to completion before the next one
/// starts; a tick that overruns the interval delays the next tick instead of
/// stacking.
pub fn spawn_posting_scheduler(service: Arc<SchedulerService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let summary = service.run_tick(now).await;
            tracing::info!(
                evaluated = summary.evaluated,
                sent = summary.sent,
                skipped = summary.skipped,
                failed = summary.failed,
                "posting tick complete"
            );
        }
    })
}
