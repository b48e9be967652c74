// src/store.rs
// Repository seams consumed by the posting pipeline, plus the bounded
// in-memory implementation used for runtime wiring and tests. Post records
// are append-only; nothing is mutated after `record_post` returns.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Channel, NewPost, Post, PostStatus};

#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn list_auto_posting(&self) -> Result<Vec<Channel>>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn record_post(&self, new_post: NewPost) -> Result<Post>;
    /// Timestamp of the most recent post with status `sent`. Failed posts do
    /// not count toward frequency gating.
    async fn last_sent_at(&self, channel_id: Uuid) -> Result<Option<DateTime<Utc>>>;
    /// Most recent posts first, at most `limit`.
    async fn recent_posts(&self, channel_id: Uuid, limit: usize) -> Result<Vec<Post>>;
}

#[derive(Debug)]
pub struct MemoryStore {
    channels: Mutex<Vec<Channel>>,
    posts: Mutex<Vec<Post>>,
    cap: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            channels: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            cap: cap.max(1),
        }
    }

    /// Replace the channel set (startup seeding from the config file).
    pub fn seed_channels(&self, channels: Vec<Channel>) {
        *self.channels.lock().expect("channel store poisoned") = channels;
    }

    pub fn posts_snapshot(&self) -> Vec<Post> {
        self.posts.lock().expect("post store poisoned").clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn list_auto_posting(&self) -> Result<Vec<Channel>> {
        let channels = self.channels.lock().expect("channel store poisoned");
        Ok(channels
            .iter()
            .filter(|c| c.auto_post_enabled)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn record_post(&self, new_post: NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            channel_id: new_post.channel_id,
            status: new_post.status,
            scheduled_for: new_post.scheduled_for,
            sent_at: new_post.sent_at,
            error: new_post.error,
            content: new_post.content,
            image_ref: new_post.image_ref,
            created_at: Utc::now(),
        };
        let mut posts = self.posts.lock().expect("post store poisoned");
        posts.push(post.clone());
        if posts.len() > self.cap {
            let excess = posts.len() - self.cap;
            posts.drain(0..excess);
        }
        Ok(post)
    }

    async fn last_sent_at(&self, channel_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let posts = self.posts.lock().expect("post store poisoned");
        Ok(posts
            .iter()
            .filter(|p| p.channel_id == channel_id && p.status == PostStatus::Sent)
            .filter_map(|p| p.sent_at)
            .max())
    }

    async fn recent_posts(&self, channel_id: Uuid, limit: usize) -> Result<Vec<Post>> {
        let posts = self.posts.lock().expect("post store poisoned");
        Ok(posts
            .iter()
            .rev()
            .filter(|p| p.channel_id == channel_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
