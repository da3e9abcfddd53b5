//! Title search and related-post ranking.
//!
//! [`similarity`] follows the `pg_trgm` definition so the in-memory
//! repository ranks exactly like PostgreSQL's `similarity()` does.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::Post;

/// Search results must score strictly above this.
pub const SIMILARITY_THRESHOLD: f32 = 0.1;

/// Number of related posts shown under a post.
pub const SIMILAR_POSTS_LIMIT: u64 = 4;

/// Trigram set of a text, `pg_trgm` style.
///
/// Words are maximal runs of alphanumeric characters, lowercased and padded
/// with two spaces in front and one behind.
pub fn trigrams(text: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    let lowered = text.to_lowercase();

    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = format!("  {} ", word).chars().collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }

    set
}

/// Shared trigrams over all distinct trigrams, in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f32 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let common = left.intersection(&right).count();
    let union = left.len() + right.len() - common;
    common as f32 / union as f32
}

/// Rank `posts` by title similarity to `query`, keeping only scores above
/// `threshold`. Ties fall back to the newest post first.
///
/// The best match comes first. This deliberately reverses the ascending
/// `order_by('similarity')` the Django blog shipped with, which listed the
/// weakest matches at the top.
pub fn rank_by_title(query: &str, posts: Vec<Post>, threshold: f32) -> Vec<(Post, f32)> {
    let mut hits: Vec<(Post, f32)> = posts
        .into_iter()
        .filter(|post| post.is_published())
        .map(|post| {
            let score = similarity(&post.title, query);
            (post, score)
        })
        .filter(|(_, score)| *score > threshold)
        .collect();

    hits.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.publish.cmp(&a.publish))
    });
    hits
}

/// Pick the posts most related to `post` by shared tags.
///
/// Only published posts sharing at least one tag qualify and `post` itself
/// is excluded. Ordered by shared-tag count, then publish date, newest first.
pub fn rank_similar(post: &Post, candidates: Vec<Post>, limit: u64) -> Vec<Post> {
    let mut scored: Vec<(usize, Post)> = candidates
        .into_iter()
        .filter(|c| c.is_published() && c.id != post.id)
        .map(|c| (post.shared_tag_count(&c), c))
        .filter(|(shared, _)| *shared > 0)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| b.publish.cmp(&a.publish))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(limit as usize)
        .map(|(_, post)| post)
        .collect()
}
