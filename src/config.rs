// src/config.rs
// Environment settings plus the channel seed file (TOML or JSON) that stands
// in for a channel database.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::model::Channel;

const ENV_CHANNELS_PATH: &str = "CHANNELS_CONFIG_PATH";

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_bot_token: String,
    pub openai_api_key: Option<String>,
    pub posting_interval_minutes: u64,
    pub feed_lookback_hours: i64,
    pub max_entries_per_source: usize,
    pub selection_pool_size: usize,
    pub feed_request_timeout_secs: u64,
    pub history_scan_limit: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN is required")?,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            posting_interval_minutes: parse_env("POSTING_INTERVAL_MINUTES", 10)?,
            feed_lookback_hours: parse_env("FEED_LOOKBACK_HOURS", 24)?,
            max_entries_per_source: parse_env("MAX_ENTRIES_PER_SOURCE", 5)?,
            selection_pool_size: parse_env("SELECTION_POOL_SIZE", 5)?,
            feed_request_timeout_secs: parse_env("FEED_REQUEST_TIMEOUT_SECS", 10)?,
            history_scan_limit: parse_env("HISTORY_SCAN_LIMIT", 50)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Deserialize)]
struct ChannelSeedFile {
    #[serde(default)]
    channels: Vec<ChannelSeed>,
}

#[derive(Debug, Deserialize)]
struct ChannelSeed {
    internal_name: String,
    telegram_chat_id: i64,
    topic: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default = "default_frequency")]
    posting_frequency_per_day: u32,
    #[serde(default)]
    posting_window_start: Option<String>,
    #[serde(default)]
    posting_window_end: Option<String>,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default)]
    auto_post_enabled: bool,
    #[serde(default)]
    content_strategy: Option<String>,
    #[serde(default)]
    generate_images: bool,
    #[serde(default)]
    news_source_lists: Option<Vec<Vec<String>>>,
}

fn default_frequency() -> u32 {
    1
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Load channels from an explicit path. Supports TOML or JSON formats.
pub fn load_channels_from(path: &Path) -> Result<Vec<Channel>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading channel config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let seeds = parse_seeds(&content, ext.as_str())?;
    seeds.into_iter().map(seed_to_channel).collect()
}

/// Load channels using env var + fallbacks:
/// 1) $CHANNELS_CONFIG_PATH
/// 2) config/channels.toml
/// 3) config/channels.json
pub fn load_channels_default() -> Result<Vec<Channel>> {
    if let Ok(p) = env::var(ENV_CHANNELS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_channels_from(&pb);
        }
        return Err(anyhow!("CHANNELS_CONFIG_PATH points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/channels.toml");
    if toml_p.exists() {
        return load_channels_from(&toml_p);
    }
    let json_p = PathBuf::from("config/channels.json");
    if json_p.exists() {
        return load_channels_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_seeds(s: &str, hint_ext: &str) -> Result<Vec<ChannelSeed>> {
    let try_toml = hint_ext == "toml" || s.contains("[[channels]]");
    if try_toml {
        if let Ok(v) = parse_toml_seeds(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json_seeds(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml_seeds(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported channel config format"))
}

fn parse_toml_seeds(s: &str) -> Result<Vec<ChannelSeed>> {
    let file: ChannelSeedFile = toml::from_str(s)?;
    Ok(file.channels)
}

fn parse_json_seeds(s: &str) -> Result<Vec<ChannelSeed>> {
    if let Ok(file) = serde_json::from_str::<ChannelSeedFile>(s) {
        return Ok(file.channels);
    }
    Ok(serde_json::from_str::<Vec<ChannelSeed>>(s)?)
}

fn seed_to_channel(seed: ChannelSeed) -> Result<Channel> {
    seed.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
        anyhow!(
            "unknown timezone '{}' for channel '{}'",
            seed.timezone,
            seed.internal_name
        )
    })?;

    let posting_window_start = seed
        .posting_window_start
        .as_deref()
        .map(parse_time_of_day)
        .transpose()
        .with_context(|| format!("channel '{}'", seed.internal_name))?;
    let posting_window_end = seed
        .posting_window_end
        .as_deref()
        .map(parse_time_of_day)
        .transpose()
        .with_context(|| format!("channel '{}'", seed.internal_name))?;

    let frequency = if seed.posting_frequency_per_day == 0 {
        tracing::warn!(
            channel = %seed.internal_name,
            "posting_frequency_per_day must be >= 1, clamping to 1"
        );
        1
    } else {
        seed.posting_frequency_per_day
    };

    Ok(Channel {
        id: Uuid::new_v4(),
        internal_name: seed.internal_name,
        telegram_chat_id: seed.telegram_chat_id,
        topic: seed.topic,
        language_code: seed.language_code,
        posting_frequency_per_day: frequency,
        posting_window_start,
        posting_window_end,
        timezone: seed.timezone,
        auto_post_enabled: seed.auto_post_enabled,
        content_strategy: seed.content_strategy,
        generate_images: seed.generate_images,
        news_source_lists: seed.news_source_lists,
    })
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| anyhow!("invalid time of day '{raw}', expected HH:MM or HH:MM:SS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_SAMPLE: &str = r#"
[[channels]]
internal_name = "daily-tech"
telegram_chat_id = -1001234
topic = "technology news"
language_code = "en"
posting_frequency_per_day = 3
posting_window_start = "09:00"
posting_window_end = "21:30"
timezone = "Europe/Prague"
auto_post_enabled = true
content_strategy = "news"
news_source_lists = [["https://a.example/rss"], ["https://b.example/rss"]]
"#;

    #[test]
    fn toml_seed_parses_into_channel() {
        let channels = parse_seeds(TOML_SAMPLE, "toml")
            .unwrap()
            .into_iter()
            .map(seed_to_channel)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(channels.len(), 1);
        let c = &channels[0];
        assert_eq!(c.internal_name, "daily-tech");
        assert_eq!(c.posting_frequency_per_day, 3);
        assert_eq!(
            c.posting_window_start,
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
        assert_eq!(
            c.posting_window_end,
            Some(NaiveTime::from_hms_opt(21, 30, 0).unwrap())
        );
        assert!(c.auto_post_enabled);
        assert_eq!(c.flattened_sources().len(), 2);
    }

    #[test]
    fn json_seed_accepts_bare_array_and_wrapper() {
        let bare = r#"[{"internal_name":"x","telegram_chat_id":1,"topic":"t"}]"#;
        let wrapped = r#"{"channels":[{"internal_name":"x","telegram_chat_id":1,"topic":"t"}]}"#;
        assert_eq!(parse_seeds(bare, "json").unwrap().len(), 1);
        assert_eq!(parse_seeds(wrapped, "json").unwrap().len(), 1);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let seed = ChannelSeed {
            internal_name: "x".into(),
            telegram_chat_id: 1,
            topic: "t".into(),
            language_code: None,
            posting_frequency_per_day: 1,
            posting_window_start: None,
            posting_window_end: None,
            timezone: "Mars/Olympus".into(),
            auto_post_enabled: false,
            content_strategy: None,
            generate_images: false,
            news_source_lists: None,
        };
        assert!(seed_to_channel(seed).is_err());
    }

    #[test]
    fn zero_frequency_is_clamped_to_one() {
        let seed = ChannelSeed {
            internal_name: "x".into(),
            telegram_chat_id: 1,
            topic: "t".into(),
            language_code: None,
            posting_frequency_per_day: 0,
            posting_window_start: None,
            posting_window_end: None,
            timezone: "UTC".into(),
            auto_post_enabled: false,
            content_strategy: None,
            generate_images: false,
            news_source_lists: None,
        };
        assert_eq!(seed_to_channel(seed).unwrap().posting_frequency_per_day, 1);
    }

    #[test]
    fn times_parse_with_and_without_seconds() {
        assert_eq!(
            parse_time_of_day("22:00").unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("03:15:30").unwrap(),
            NaiveTime::from_hms_opt(3, 15, 30).unwrap()
        );
        assert!(parse_time_of_day("25:00").is_err());
    }
}
