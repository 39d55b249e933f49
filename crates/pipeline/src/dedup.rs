//! Post deduplication.
//!
//! Feeds may repeat posts. Posts are put into a canonical order first, so the
//! surviving copy of a duplicate is the same on every run regardless of the
//! order the feed returned them in.

use sentitrade_core::{DedupStrategy, Post};
use std::collections::HashSet;

/// Removes duplicate posts and returns the survivors in canonical order
/// (timestamp, then id, then text).
#[must_use]
pub fn deduplicate(mut posts: Vec<Post>, strategy: DedupStrategy) -> Vec<Post> {
    posts.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.raw_text.cmp(&b.raw_text))
    });

    match strategy {
        DedupStrategy::Id => {
            let mut seen = HashSet::new();
            posts.retain(|p| seen.insert(p.id.clone()));
        }
        DedupStrategy::Content => {
            let mut seen = HashSet::new();
            posts.retain(|p| seen.insert((p.ticker.clone(), p.timestamp, p.raw_text.clone())));
        }
    }
    posts
}
