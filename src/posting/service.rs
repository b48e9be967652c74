// src/posting/service.rs
// One posting run: resolve generator -> derive excluded links -> generate ->
// optional image -> deliver -> record history. Exactly one history write per
// non-skip run; the write on a delivery failure happens before the error is
// returned so history is never lost on a send error.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::content::{ContentGenerator, ContentRegistry};
use crate::images::ImageClient;
use crate::links;
use crate::model::{Channel, NewPost, PostStatus};
use crate::store::PostStore;
use crate::telegram::{PhotoRef, Publisher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Sent,
    /// The generator produced no content; nothing was written or delivered.
    Skipped,
}

pub struct PostingService {
    registry: Arc<ContentRegistry>,
    posts: Arc<dyn PostStore>,
    publisher: Arc<dyn Publisher>,
    images: Option<Arc<dyn ImageClient>>,
    history_scan_limit: usize,
}

impl PostingService {
    pub fn new(
        registry: Arc<ContentRegistry>,
        posts: Arc<dyn PostStore>,
        publisher: Arc<dyn Publisher>,
        images: Option<Arc<dyn ImageClient>>,
        history_scan_limit: usize,
    ) -> Self {
        Self {
            registry,
            posts,
            publisher,
            images,
            history_scan_limit,
        }
    }

    pub async fn create_and_send_post(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<PostOutcome> {
        let generator = self.registry.resolve(channel.content_strategy.as_deref());

        let history = self
            .posts
            .recent_posts(channel.id, self.history_scan_limit)
            .await
            .context("loading post history")?;
        let excluded: HashSet<String> =
            links::extract_links(history.iter().map(|p| p.content.as_str()));

        let content = generator
            .generate(channel, now, &excluded)
            .await
            .context("generating content")?;
        if content.trim().is_empty() {
            tracing::info!(channel = %channel.internal_name, "generator produced no content, skipping");
            return Ok(PostOutcome::Skipped);
        }
        tracing::info!(channel = %channel.internal_name, "generated content");

        let image = self.maybe_generate_image(channel, &content).await;
        let (photo, image_ref) = match image {
            Some((photo, reference)) => (Some(photo), Some(reference)),
            None => (None, None),
        };

        let delivery = match &photo {
            Some(photo) => {
                self.publisher
                    .send_photo(channel.telegram_chat_id, photo, &content)
                    .await
            }
            None => {
                self.publisher
                    .send_text(channel.telegram_chat_id, &content)
                    .await
            }
        };

        match delivery {
            Ok(()) => {
                self.posts
                    .record_post(NewPost {
                        channel_id: channel.id,
                        status: PostStatus::Sent,
                        scheduled_for: now,
                        sent_at: Some(now),
                        error: None,
                        content,
                        image_ref,
                    })
                    .await
                    .context("recording sent post")?;
                Ok(PostOutcome::Sent)
            }
            Err(e) => {
                tracing::warn!(error = ?e, channel = %channel.internal_name, "delivery failed");
                self.posts
                    .record_post(NewPost {
                        channel_id: channel.id,
                        status: PostStatus::Failed,
                        scheduled_for: now,
                        sent_at: None,
                        error: Some(format!("{e:#}")),
                        content,
                        image_ref,
                    })
                    .await
                    .context("recording failed post")?;
                Err(e.context("delivering post"))
            }
        }
    }

    /// Image failure never blocks text delivery; it degrades to text-only.
    async fn maybe_generate_image(
        &self,
        channel: &Channel,
        content: &str,
    ) -> Option<(PhotoRef, String)> {
        if !channel.generate_images {
            return None;
        }
        let client = self.images.as_ref()?;
        match client.generate_image(content).await {
            Ok(image) => {
                if let Some(url) = image.url {
                    Some((PhotoRef::Url(url.clone()), url))
                } else if let Some(bytes) = image.bytes {
                    Some((PhotoRef::Bytes(bytes), "generated:inline".to_string()))
                } else {
                    tracing::warn!(
                        channel = %channel.internal_name,
                        "image client returned neither url nor bytes, sending text only"
                    );
                    None
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    channel = %channel.internal_name,
                    "image generation failed, sending text only"
                );
                None
            }
        }
    }
}
