// src/select.rs
// Candidate selection: exclusion, recency ranking, article preference and a
// deterministic seeded pick from the freshness pool.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::links;
use crate::model::NewsCandidate;
use crate::text::squash_spaces;

/// Outcome of a pick. "Nothing fetched" and "everything already posted" are
/// distinct conditions and are reported as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(NewsCandidate),
    /// Candidates existed, but every link was in the exclusion set. Never
    /// falls back to a seen item.
    AllSeen,
    /// No candidates at all.
    Empty,
}

/// Pick one candidate. The seed is passed explicitly (the caller uses the
/// tick timestamp) so a tick reproduces its choice while different ticks
/// still vary away from the single freshest item.
///
/// When no pool member looks article-like the full freshness pool is kept; a
/// non-empty pool always yields a candidate.
pub fn pick_best(
    candidates: Vec<NewsCandidate>,
    exclude_links: &HashSet<String>,
    pool_size: usize,
    seed: u64,
) -> Selection {
    if candidates.is_empty() {
        return Selection::Empty;
    }

    let mut fresh = if exclude_links.is_empty() {
        candidates
    } else {
        let kept: Vec<NewsCandidate> = candidates
            .into_iter()
            .filter(|c| !exclude_links.contains(&links::normalize_link(&c.link)))
            .collect();
        if kept.is_empty() {
            return Selection::AllSeen;
        }
        kept
    };

    fresh.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    fresh.truncate(pool_size.max(1));

    let article_like: Vec<NewsCandidate> = fresh
        .iter()
        .filter(|c| is_probably_article(c))
        .cloned()
        .collect();
    let pool = if article_like.is_empty() {
        fresh
    } else {
        article_like
    };

    let mut rng = StdRng::seed_from_u64(seed);
    match pool.choose(&mut rng) {
        Some(candidate) => Selection::Chosen(candidate.clone()),
        None => Selection::Empty,
    }
}

/// Heuristic for "real article": a non-trivial summary and a link that does
/// not point at a section/listing page.
pub fn is_probably_article(candidate: &NewsCandidate) -> bool {
    if squash_spaces(&candidate.summary).chars().count() < 20 {
        return false;
    }
    !links::looks_like_section_link(&candidate.link)
}
