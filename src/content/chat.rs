// src/content/chat.rs

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ai::ChatClient;
use crate::content::ContentGenerator;
use crate::model::Channel;

/// Turns the channel topic into a short standalone post via one chat call.
pub struct ChatTopicGenerator {
    chat: Arc<dyn ChatClient>,
}

impl ChatTopicGenerator {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl ContentGenerator for ChatTopicGenerator {
    async fn generate(
        &self,
        channel: &Channel,
        _now: DateTime<Utc>,
        _excluded_links: &HashSet<String>,
    ) -> Result<String> {
        let language = channel.language_code.as_deref().unwrap_or("en");
        let system = format!(
            "You are a Telegram content assistant. Generate a concise, engaging post for the channel. \
             Topic: {}. Language code: {}. \
             Focus on value and include a call-to-action if relevant.",
            channel.topic, language
        );
        let text = self.chat.complete(&system, "Write the post.", 160, 0.7).await?;
        Ok(text.trim().to_string())
    }
}
