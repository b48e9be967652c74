// src/content/placeholder.rs

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::content::ContentGenerator;
use crate::model::Channel;

/// Deterministic, no-IO generator. Registry default, also handy in tests.
pub struct PlaceholderGenerator;

#[async_trait]
impl ContentGenerator for PlaceholderGenerator {
    async fn generate(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
        _excluded_links: &HashSet<String>,
    ) -> Result<String> {
        Ok(format!(
            "[{}] Updates for {} (topic: {}). Stay tuned!",
            now.to_rfc3339(),
            channel.internal_name,
            channel.topic
        ))
    }
}
