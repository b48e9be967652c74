// src/model.rs
// Channel configuration, post history records and transient feed candidates.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A managed Telegram channel: content policy plus posting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub internal_name: String,
    pub telegram_chat_id: i64,
    pub topic: String,
    pub language_code: Option<String>,
    /// Target posts per 24 hours; must be >= 1.
    pub posting_frequency_per_day: u32,
    pub posting_window_start: Option<NaiveTime>,
    pub posting_window_end: Option<NaiveTime>,
    /// IANA timezone identifier, e.g. "Europe/Prague".
    pub timezone: String,
    pub auto_post_enabled: bool,
    /// Key into the content generator registry; `None` means the default.
    pub content_strategy: Option<String>,
    pub generate_images: bool,
    /// Grouped feed URLs; the grouping is kept for configuration, fetching
    /// works on the flattened list.
    pub news_source_lists: Option<Vec<Vec<String>>>,
}

impl Channel {
    pub fn flattened_sources(&self) -> Vec<String> {
        self.news_source_lists
            .iter()
            .flatten()
            .flatten()
            .filter(|url| !url.is_empty())
            .cloned()
            .collect()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            internal_name: String::new(),
            telegram_chat_id: 0,
            topic: String::new(),
            language_code: None,
            posting_frequency_per_day: 1,
            posting_window_start: None,
            posting_window_end: None,
            timezone: "UTC".to_string(),
            auto_post_enabled: false,
            content_strategy: None,
            generate_images: false,
            news_source_lists: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Queued,
    Sent,
    Failed,
}

/// One posting attempt. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub status: PostStatus,
    /// The tick timestamp at which generation was attempted.
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub content: String,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for `PostStore::record_post`; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub channel_id: Uuid,
    pub status: PostStatus,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub content: String,
    pub image_ref: Option<String>,
}

/// A single feed entry eligible for becoming a post. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCandidate {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Always attributable: falls back to fetch time when the feed omits it.
    pub published_at: DateTime<Utc>,
    pub source: String,
}
