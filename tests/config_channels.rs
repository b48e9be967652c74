// tests/config_channels.rs
use std::{env, fs};

use tg_auto_channels::config::{load_channels_default, load_channels_from};

const ENV_PATH: &str = "CHANNELS_CONFIG_PATH";

const TOML_CHANNELS: &str = r#"
[[channels]]
internal_name = "morning-brief"
telegram_chat_id = -1009999
topic = "world news"
posting_frequency_per_day = 2
posting_window_start = "07:30"
posting_window_end = "22:00"
timezone = "Europe/Berlin"
auto_post_enabled = true
content_strategy = "news"
news_source_lists = [["https://w.example/rss", "https://x.example/rss"]]
"#;

const JSON_CHANNELS: &str = r#"{
  "channels": [
    {
      "internal_name": "evening-brief",
      "telegram_chat_id": -1008888,
      "topic": "markets",
      "timezone": "America/New_York"
    }
  ]
}"#;

#[test]
fn toml_file_loads_with_window_and_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.toml");
    fs::write(&path, TOML_CHANNELS).unwrap();

    let channels = load_channels_from(&path).unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].internal_name, "morning-brief");
    assert_eq!(channels[0].posting_frequency_per_day, 2);
    assert!(channels[0].posting_window_start.is_some());
    assert_eq!(channels[0].flattened_sources().len(), 2);
}

#[test]
fn json_file_loads_with_defaults_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.json");
    fs::write(&path, JSON_CHANNELS).unwrap();

    let channels = load_channels_from(&path).unwrap();
    assert_eq!(channels.len(), 1);
    let c = &channels[0];
    assert_eq!(c.internal_name, "evening-brief");
    assert_eq!(c.posting_frequency_per_day, 1);
    assert!(!c.auto_post_enabled);
    assert!(c.posting_window_start.is_none());
}

#[test]
fn bad_timezone_in_the_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.toml");
    fs::write(
        &path,
        r#"
[[channels]]
internal_name = "broken"
telegram_chat_id = 1
topic = "t"
timezone = "Nowhere/Null"
"#,
    )
    .unwrap();
    assert!(load_channels_from(&path).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_PATH);

    // no files in the temp CWD -> empty set
    let none = load_channels_default().unwrap();
    assert!(none.is_empty());

    // env var takes precedence
    let p_json = tmp.path().join("seeded.json");
    fs::write(&p_json, JSON_CHANNELS).unwrap();
    env::set_var(ENV_PATH, p_json.display().to_string());
    let seeded = load_channels_default().unwrap();
    assert_eq!(seeded.len(), 1);
    env::remove_var(ENV_PATH);

    // fallback path in the CWD
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/channels.toml"), TOML_CHANNELS).unwrap();
    let from_fallback = load_channels_default().unwrap();
    assert_eq!(from_fallback.len(), 1);
    assert_eq!(from_fallback[0].internal_name, "morning-brief");

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_path_to_missing_file_is_an_error() {
    env::set_var(ENV_PATH, "/definitely/not/here.toml");
    assert!(load_channels_default().is_err());
    env::remove_var(ENV_PATH);
}
