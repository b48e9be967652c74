// src/posting/policy.rs
// Decides whether "now" is eligible for a new post: daily window in the
// channel's timezone plus frequency gating against the last sent post.
// No mutation; safe to call speculatively for previews/dry-runs.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::model::Channel;
use crate::store::PostStore;

/// Inclusive daily-window membership. A window with `start > end` wraps past
/// midnight; any absent bound means the check passes.
pub fn in_window(now_local: NaiveTime, start: Option<NaiveTime>, end: Option<NaiveTime>) -> bool {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => return true,
    };
    if start <= end {
        start <= now_local && now_local <= end
    } else {
        now_local >= start || now_local <= end
    }
}

/// Minimum inter-post interval for a frequency, at millisecond precision so
/// non-divisor frequencies gate accurately.
pub fn min_interval(posts_per_day: u32) -> Duration {
    Duration::milliseconds(86_400_000 / i64::from(posts_per_day.max(1)))
}

pub struct PostingPolicy {
    posts: Arc<dyn PostStore>,
}

impl PostingPolicy {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    pub async fn should_post(&self, channel: &Channel, now: DateTime<Utc>) -> Result<bool> {
        let tz: Tz = channel.timezone.parse().map_err(|_| {
            anyhow!(
                "unknown timezone '{}' for channel '{}'",
                channel.timezone,
                channel.internal_name
            )
        })?;
        let now_local = now.with_timezone(&tz).time();
        if !in_window(
            now_local,
            channel.posting_window_start,
            channel.posting_window_end,
        ) {
            return Ok(false);
        }

        let last_sent = self.posts.last_sent_at(channel.id).await?;
        Ok(match last_sent {
            None => true,
            // boundary inclusive: exactly min_interval after the last sent
            // post is eligible again
            Some(t0) => now - t0 >= min_interval(channel.posting_frequency_per_day),
        })
    }
}
