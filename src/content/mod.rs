// src/content/mod.rs
pub mod chat;
pub mod news_digest;
pub mod placeholder;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ai::ChatClient;
use crate::config::Settings;
use crate::feeds::FeedAggregator;
use crate::model::Channel;

use self::chat::ChatTopicGenerator;
use self::news_digest::{DigestConfig, NewsDigestGenerator};
use self::placeholder::PlaceholderGenerator;

/// One content strategy. Blank output means "nothing to post this tick" and
/// is not an error; errors are failures of the run.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
        excluded_links: &HashSet<String>,
    ) -> Result<String>;
}

pub type DynGenerator = Arc<dyn ContentGenerator>;

/// String-keyed generator registry with an explicit default. Lookup misses
/// fall back to the default instead of failing the tick.
pub struct ContentRegistry {
    generators: HashMap<String, DynGenerator>,
    default_key: String,
}

impl ContentRegistry {
    pub fn new(default_key: &str, default_generator: DynGenerator) -> Self {
        let mut generators = HashMap::new();
        generators.insert(default_key.to_string(), default_generator);
        Self {
            generators,
            default_key: default_key.to_string(),
        }
    }

    pub fn register(&mut self, name: &str, generator: DynGenerator) {
        self.generators.insert(name.to_string(), generator);
    }

    pub fn get(&self, name: &str) -> Option<&DynGenerator> {
        self.generators.get(name)
    }

    pub fn default_generator(&self) -> &DynGenerator {
        &self.generators[&self.default_key]
    }

    pub fn resolve(&self, name: Option<&str>) -> &DynGenerator {
        match name {
            Some(key) => match self.generators.get(key) {
                Some(generator) => generator,
                None => {
                    tracing::warn!(strategy = key, "content strategy not registered, using default");
                    self.default_generator()
                }
            },
            None => self.default_generator(),
        }
    }
}

/// Build the startup registry. Model-backed strategies are only registered
/// when a chat client is configured.
pub fn build_registry(
    settings: &Settings,
    chat: Option<Arc<dyn ChatClient>>,
    aggregator: Arc<FeedAggregator>,
) -> ContentRegistry {
    let mut registry = ContentRegistry::new("placeholder", Arc::new(PlaceholderGenerator));
    if let Some(chat) = chat {
        registry.register("chat", Arc::new(ChatTopicGenerator::new(chat.clone())));
        registry.register(
            "news",
            Arc::new(NewsDigestGenerator::new(
                aggregator,
                chat,
                DigestConfig {
                    lookback_hours: settings.feed_lookback_hours,
                    selection_pool_size: settings.selection_pool_size,
                    request_timeout_secs: settings.feed_request_timeout_secs,
                },
            )),
        );
    }
    registry
}
