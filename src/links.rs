// src/links.rs
// URL canonicalization and link scanning used for "already posted" dedup.
// Equality is always checked on the normalized form, never on raw strings.

use std::collections::HashSet;

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

/// Path segments that mark section/listing pages rather than articles.
const SECTION_MARKERS: [&str; 8] = [
    "section",
    "sections",
    "category",
    "categories",
    "specials",
    "topics",
    "tags",
    "collections",
];

/// Canonicalize a URL for dedup comparison: lowercase scheme and host, strip
/// a trailing slash from the path, drop query and fragment. Input without a
/// host (or unparseable input) passes through unchanged.
pub fn normalize_link(link: &str) -> String {
    let parsed = match Url::parse(link) {
        Ok(u) => u,
        Err(_) => return link.to_string(),
    };
    let host = match parsed.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return link.to_string(),
    };
    let scheme = parsed.scheme().to_ascii_lowercase();
    let port = match parsed.port() {
        Some(p) => format!(":{p}"),
        None => String::new(),
    };
    let path = parsed.path().trim_end_matches('/');
    format!("{scheme}://{host}{port}{path}")
}

/// Scan text blobs (recent post contents) for embedded URLs and return the
/// set of normalized links.
pub fn extract_links<'a, I>(texts: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    static RE_LINK: OnceCell<Regex> = OnceCell::new();
    let re = RE_LINK.get_or_init(|| Regex::new(r#"https?://[^\s<>"'\)\]]+"#).unwrap());

    let mut out = HashSet::new();
    for text in texts {
        for m in re.find_iter(text) {
            let raw = m.as_str().trim_end_matches(['.', ',', ';']);
            out.insert(normalize_link(raw));
        }
    }
    out
}

/// True when the link points at a section/listing page instead of an article.
pub fn looks_like_section_link(link: &str) -> bool {
    let parsed = match Url::parse(link) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let path = parsed.path().to_ascii_lowercase();
    if SECTION_MARKERS
        .iter()
        .any(|marker| path.contains(&format!("/{marker}")))
    {
        return true;
    }
    parsed
        .query()
        .is_some_and(|q| q.to_ascii_lowercase().contains("section"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_link("HTTPS://Example.COM/News/Item/?utm=1#frag");
        assert_eq!(once, "https://example.com/News/Item");
        assert_eq!(normalize_link(&once), once);
    }

    #[test]
    fn trailing_slash_and_case_variants_collapse() {
        let a = normalize_link("https://example.com/story/");
        let b = normalize_link("HTTPS://EXAMPLE.COM/story");
        assert_eq!(a, b);
    }

    #[test]
    fn hostless_input_passes_through() {
        assert_eq!(normalize_link("not a url"), "not a url");
        assert_eq!(normalize_link("mailto:ops@example.com"), "mailto:ops@example.com");
    }

    #[test]
    fn extract_links_normalizes_and_dedups() {
        let blobs = [
            "Read https://Example.com/a/ and https://example.com/a today.",
            "<b>Also</b>\nOriginal: https://other.example/b?ref=feed",
        ];
        let links = extract_links(blobs.iter().copied());
        assert_eq!(links.len(), 2);
        assert!(links.contains("https://example.com/a"));
        assert!(links.contains("https://other.example/b"));
    }

    #[test]
    fn section_links_are_detected() {
        assert!(looks_like_section_link("https://ex.com/sections/world"));
        assert!(looks_like_section_link("https://ex.com/category/tech/"));
        assert!(looks_like_section_link("https://ex.com/view?section=world"));
        assert!(!looks_like_section_link("https://ex.com/2024/01/article-slug"));
    }
}
