// src/content/news_digest.rs
// The feed-driven strategy: aggregate sources, pick one unseen candidate,
// fetch the article, summarize it and format the digest.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::ai::ChatClient;
use crate::content::ContentGenerator;
use crate::feeds::FeedAggregator;
use crate::model::{Channel, NewsCandidate};
use crate::select::{self, Selection};
use crate::text;

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub lookback_hours: i64,
    pub selection_pool_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 24,
            selection_pool_size: 5,
            request_timeout_secs: 10,
        }
    }
}

pub struct NewsDigestGenerator {
    aggregator: Arc<FeedAggregator>,
    chat: Arc<dyn ChatClient>,
    http: reqwest::Client,
    cfg: DigestConfig,
}

impl NewsDigestGenerator {
    pub fn new(aggregator: Arc<FeedAggregator>, chat: Arc<dyn ChatClient>, cfg: DigestConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("tg-auto-channels/0.1")
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("reqwest client");
        Self {
            aggregator,
            chat,
            http,
            cfg,
        }
    }

    async fn summarize(&self, candidate: &NewsCandidate, language: &str) -> Result<String> {
        let article_text = text::squash_spaces(&self.fetch_article_text(&candidate.link).await);
        let summary_text = text::squash_spaces(&candidate.summary);
        if article_text.is_empty() {
            tracing::info!(link = %candidate.link, "article text empty after cleanup");
        }

        let mut context = format!("{summary_text}\n\n{article_text}").trim().to_string();
        if context.is_empty() {
            context = candidate.title.clone();
        }
        // keep the prompt compact
        let context: String = context.chars().take(4000).collect();

        let system = "You are the editor of a Telegram news channel. You get a headline, an RSS \
             excerpt and, when available, the article text. Produce a headline and a 3-4 sentence \
             summary in the requested language. Ignore ads, sign-up prompts, webinars, video \
             player errors, tracking/notification banners and 'page not found' messages. Do not \
             describe sections or rubrics and do not invent facts. Answer strictly as:\n\
             HEADLINE: <headline>\nSUMMARY: <3-4 sentence summary>";
        let user = format!(
            "Summary language: {language}\nFeed headline: {}\nRSS excerpt: {summary_text}\n\
             Article text (may be empty): {context}\nLink: {}\nSource: {}",
            candidate.title, candidate.link, candidate.source
        );

        let raw = self.chat.complete(system, &user, 220, 0.2).await?;
        let fallback_summary = if summary_text.is_empty() {
            article_text.as_str()
        } else {
            summary_text.as_str()
        };
        let (headline, summary) = parse_headline_summary(&raw, &candidate.title, fallback_summary);
        let summary = text::strip_promotional(&summary);

        let translation = google_translate_link(&candidate.link, language);
        Ok(format!(
            "<b>{headline}</b>\n{summary}\n\nTranslation: {translation}\nOriginal: {}",
            candidate.link
        ))
    }

    async fn fetch_article_text(&self, url: &str) -> String {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(error = ?e, link = %url, "failed to fetch article");
                return String::new();
            }
        };
        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                tracing::info!(error = ?e, link = %url, "article fetch returned error status");
                return String::new();
            }
        };
        match response.text().await {
            Ok(body) => text::extract_text_from_html(&body),
            Err(e) => {
                tracing::info!(error = ?e, link = %url, "failed to read article body");
                String::new()
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for NewsDigestGenerator {
    async fn generate(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
        excluded_links: &HashSet<String>,
    ) -> Result<String> {
        let sources = channel.flattened_sources();
        if sources.is_empty() {
            return Ok(String::new());
        }

        let cutoff = now - chrono::Duration::hours(self.cfg.lookback_hours);
        let candidates = self.aggregator.collect(&sources, cutoff, now).await;

        let seed = now.timestamp().max(0) as u64;
        let chosen = match select::pick_best(
            candidates,
            excluded_links,
            self.cfg.selection_pool_size,
            seed,
        ) {
            Selection::Chosen(candidate) => candidate,
            Selection::AllSeen => {
                tracing::info!(channel = %channel.internal_name, "every fresh candidate was already posted");
                return Ok(String::new());
            }
            Selection::Empty => {
                tracing::info!(channel = %channel.internal_name, "no fresh candidates from any source");
                return Ok(String::new());
            }
        };

        self.summarize(&chosen, channel.language_code.as_deref().unwrap_or("en"))
            .await
    }
}

fn parse_headline_summary(
    raw: &str,
    fallback_headline: &str,
    fallback_summary: &str,
) -> (String, String) {
    let mut headline = fallback_headline.to_string();
    let mut summary = fallback_summary.to_string();
    for line in raw.lines() {
        let trimmed = line.trim();
        let upper = trimmed.to_ascii_uppercase();
        if upper.starts_with("HEADLINE:") {
            if let Some(rest) = trimmed.splitn(2, ':').nth(1) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    headline = rest.to_string();
                }
            }
        } else if upper.starts_with("SUMMARY:") {
            if let Some(rest) = trimmed.splitn(2, ':').nth(1) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    summary = rest.to_string();
                }
            }
        }
    }
    // A reply that ignored the format entirely still beats the feed excerpt.
    if summary == fallback_summary && !raw.trim().is_empty() {
        summary = raw.trim().to_string();
    }
    (headline, summary)
}

fn google_translate_link(link: &str, target_lang: &str) -> String {
    if link.is_empty() {
        return String::new();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(link.as_bytes()).collect();
    format!(
        "https://translate.google.com/translate?hl={target_lang}&sl=auto&tl={target_lang}&u={encoded}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_reply_is_parsed() {
        let raw = "HEADLINE: Markets slide\nSUMMARY: Stocks fell. Bonds rallied.";
        let (h, s) = parse_headline_summary(raw, "fallback title", "fallback summary");
        assert_eq!(h, "Markets slide");
        assert_eq!(s, "Stocks fell. Bonds rallied.");
    }

    #[test]
    fn unformatted_reply_becomes_the_summary() {
        let raw = "Just a loose paragraph about the story.";
        let (h, s) = parse_headline_summary(raw, "feed title", "excerpt");
        assert_eq!(h, "feed title");
        assert_eq!(s, "Just a loose paragraph about the story.");
    }

    #[test]
    fn empty_reply_keeps_fallbacks() {
        let (h, s) = parse_headline_summary("", "feed title", "excerpt");
        assert_eq!(h, "feed title");
        assert_eq!(s, "excerpt");
    }

    #[test]
    fn translate_link_urlencodes_the_target() {
        let link = google_translate_link("https://ex.com/a?x=1", "de");
        assert!(link.starts_with("https://translate.google.com/translate?hl=de"));
        assert!(link.contains("https%3A%2F%2Fex.com%2Fa%3Fx%3D1"));
        assert_eq!(google_translate_link("", "de"), "");
    }
}
