// src/feeds/parse.rs
// Feed XML -> candidates. RSS 2.0 first, Atom as fallback, via quick-xml.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::model::NewsCandidate;
use crate::text::squash_spaces;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    // quick-xml's serde deserializer drops the namespace prefix, so
    // `<content:encoded>` binds under the local name `encoded`.
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<AtomText>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    #[serde(rename = "content", default)]
    content: Vec<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// Entry shape shared by both formats before candidate assembly.
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    summary: String,
    published_raw: Option<String>,
}

/// Parse one feed body into candidates: per-source cap applied first, missing
/// dates fall back to `now`, entries older than `cutoff` are dropped here.
pub fn parse_feed(
    xml: &str,
    source_url: &str,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
    max_entries: usize,
) -> Result<Vec<NewsCandidate>> {
    let t0 = std::time::Instant::now();
    let scrubbed = scrub_html_entities_for_xml(xml);

    let (feed_title, entries) = parse_rss(&scrubbed).or_else(|rss_err| {
        parse_atom(&scrubbed)
            .map_err(|atom_err| anyhow!("neither RSS ({rss_err}) nor Atom ({atom_err})"))
    })?;

    let source_label = feed_title
        .map(|t| squash_spaces(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| source_url.to_string());

    let mut out = Vec::new();
    for entry in entries.into_iter().take(max_entries) {
        let published_at = entry
            .published_raw
            .as_deref()
            .and_then(parse_feed_date)
            .unwrap_or(now);
        if published_at < cutoff {
            continue;
        }
        out.push(NewsCandidate {
            title: entry
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "(untitled)".to_string()),
            link: entry.link.unwrap_or_else(|| source_url.to_string()),
            summary: entry.summary,
            published_at,
            source: source_label.clone(),
        });
    }

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

fn parse_rss(xml: &str) -> Result<(Option<String>, Vec<RawEntry>)> {
    let rss: Rss = from_str(xml)?;
    let entries = rss
        .channel
        .items
        .into_iter()
        .map(|item| {
            // Summary: prefer the plain description text, fall back to the
            // content variant.
            let summary = item
                .description
                .filter(|d| !d.trim().is_empty())
                .or(item.content_encoded)
                .unwrap_or_default();
            RawEntry {
                title: item.title,
                link: item.link,
                summary,
                published_raw: item.pub_date,
            }
        })
        .collect();
    Ok((rss.channel.title, entries))
}

fn parse_atom(xml: &str) -> Result<(Option<String>, Vec<RawEntry>)> {
    let feed: AtomFeed = from_str(xml)?;
    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let summary = entry
                .summary
                .and_then(|s| s.value)
                .filter(|s| !s.trim().is_empty())
                .or_else(|| entry.content.into_iter().find_map(|c| c.value))
                .unwrap_or_default();
            RawEntry {
                title: entry.title.and_then(|t| t.value),
                link: entry.links.into_iter().find_map(|l| l.href),
                summary,
                published_raw: entry.published.or(entry.updated),
            }
        })
        .collect();
    Ok((feed.title.and_then(|t| t.value), entries))
}

fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    // Feeds commonly use the obsolete "GMT"/"UT" zone names RFC 2822 allows.
    let rfc2822_input = match trimmed
        .strip_suffix(" GMT")
        .or_else(|| trimmed.strip_suffix(" UT"))
    {
        Some(stripped) => format!("{stripped} +0000"),
        None => trimmed.to_string(),
    };
    let parsed = OffsetDateTime::parse(&rfc2822_input, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(trimmed, &Rfc3339))
        .ok()?;
    DateTime::<Utc>::from_timestamp(parsed.unix_timestamp(), 0)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Example Wire</title>
  <item>
    <title>Fresh story</title>
    <link>https://example.com/fresh</link>
    <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    <description>Something happened and here are the details.</description>
  </item>
  <item>
    <title>Stale story</title>
    <link>https://example.com/stale</link>
    <pubDate>Fri, 01 Jan 2021 12:00:00 GMT</pubDate>
    <description>Old news.</description>
  </item>
</channel></rss>"#;

    #[test]
    fn rss_entries_are_filtered_by_cutoff() {
        let now = ts(1_704_114_000); // 2024-01-01T13:00:00Z
        let cutoff = now - chrono::Duration::hours(24);
        let out = parse_feed(RSS_SAMPLE, "https://example.com/rss", cutoff, now, 5).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Fresh story");
        assert_eq!(out[0].source, "Example Wire");
    }

    #[test]
    fn per_source_cap_limits_entries_before_filtering() {
        let now = ts(1_704_114_000);
        let cutoff = now - chrono::Duration::hours(24);
        let out = parse_feed(RSS_SAMPLE, "https://example.com/rss", cutoff, now, 1).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].link, "https://example.com/fresh");
    }

    #[test]
    fn missing_pub_date_falls_back_to_fetch_time() {
        let xml = r#"<rss version="2.0"><channel><title>W</title>
            <item><title>No date</title><link>https://x.example/a</link>
            <description>Body text here.</description></item>
        </channel></rss>"#;
        let now = ts(1_700_000_000);
        let cutoff = now - chrono::Duration::hours(24);
        let out = parse_feed(xml, "https://x.example/rss", cutoff, now, 5).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].published_at, now);
    }

    #[test]
    fn content_encoded_is_used_when_description_is_missing() {
        let xml = r#"<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
        <channel><title>W</title>
            <item><title>Only content</title><link>https://x.example/b</link>
            <content:encoded>Full body of the story.</content:encoded></item>
        </channel></rss>"#;
        let now = ts(1_700_000_000);
        let cutoff = now - chrono::Duration::hours(24);
        let out = parse_feed(xml, "https://x.example/rss", cutoff, now, 5).unwrap();
        assert_eq!(out[0].summary, "Full body of the story.");
    }

    #[test]
    fn atom_feeds_parse_via_fallback() {
        let xml = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Wire</title>
  <entry>
    <title>Atom entry</title>
    <link href="https://atom.example/entry1"/>
    <summary>Short summary of the atom entry.</summary>
    <updated>2024-01-01T10:00:00Z</updated>
  </entry>
</feed>"#;
        let now = ts(1_704_114_000);
        let cutoff = now - chrono::Duration::hours(24);
        let out = parse_feed(xml, "https://atom.example/feed", cutoff, now, 5).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].link, "https://atom.example/entry1");
        assert_eq!(out[0].source, "Atom Wire");
        assert_eq!(out[0].summary, "Short summary of the atom entry.");
    }

    #[test]
    fn garbage_is_an_error_not_a_panic() {
        let now = ts(1_700_000_000);
        let cutoff = now - chrono::Duration::hours(24);
        assert!(parse_feed("{not xml}", "https://x.example", cutoff, now, 5).is_err());
    }
}
