// src/text.rs
// Plain-text helpers shared by candidate selection and the news digest:
// whitespace squashing, lightweight HTML-to-text and boilerplate filtering.

use once_cell::sync::OnceCell;
use regex::Regex;

pub fn squash_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lightweight HTML-to-text conversion with basic boilerplate stripping.
/// Prefers `<p>` blocks; falls back to the whole page when none survive.
pub fn extract_text_from_html(html: &str) -> String {
    static RE_SCRIPT: OnceCell<Regex> = OnceCell::new();
    static RE_PARAGRAPH: OnceCell<Regex> = OnceCell::new();
    let re_script = RE_SCRIPT.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").unwrap()
    });
    let re_paragraph = RE_PARAGRAPH.get_or_init(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap());

    let cleaned = re_script.replace_all(html, " ");

    let mut parts: Vec<String> = Vec::new();
    for cap in re_paragraph.captures_iter(&cleaned) {
        let text = squash_spaces(&strip_tags(&cap[1]));
        if text.chars().count() < 20 {
            continue;
        }
        if looks_like_boilerplate(&text) {
            continue;
        }
        parts.push(text);
    }

    if parts.is_empty() {
        let text = squash_spaces(&strip_tags(&cleaned));
        if looks_like_boilerplate(&text) {
            return String::new();
        }
        return text;
    }
    parts.join("\n")
}

fn strip_tags(fragment: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let without_tags = re_tags.replace_all(fragment, " ");
    html_escape::decode_html_entities(&without_tags).to_string()
}

pub fn looks_like_boilerplate(text: &str) -> bool {
    const BOILERPLATE_KEYWORDS: [&str; 18] = [
        "cookies",
        "privacy",
        "navigation",
        "menu",
        "subscribe",
        "newsletter",
        "sign up",
        "manage subscription",
        "notification",
        "page not found",
        "content not available",
        "does not exist",
        "unavailable",
        "video player",
        "enable tracking",
        "adblock",
        "register to watch",
        "skip to main",
    ];
    let lowered = text.to_lowercase();
    BOILERPLATE_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Drop promotional sentences (sign-up prompts, webinars, CTAs). Returns the
/// input unchanged when every sentence would be dropped.
pub fn strip_promotional(text: &str) -> String {
    const PROMO_KEYWORDS: [&str; 8] = [
        "subscribe",
        "newsletter",
        "sign up",
        "register",
        "join us",
        "webinar",
        "conference",
        "watch live",
    ];

    static RE_SENTENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_SENTENCE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());

    let kept: Vec<&str> = re
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lowered = s.to_lowercase();
            !PROMO_KEYWORDS.iter().any(|k| lowered.contains(k))
        })
        .collect();

    let cleaned = kept.join(" ");
    if cleaned.is_empty() {
        text.to_string()
    } else {
        cleaned
    }
}
