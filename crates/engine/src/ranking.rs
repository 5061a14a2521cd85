//! Ranking selector: finds the single most-upvoted content item.
//!
//! Ties on upvote count go to the earliest `created_at`, then to the lowest
//! `id`. `PgStore::most_upvoted` applies the same order in SQL.

use std::cmp::Ordering;

use campus_common::types::ContentItem;

/// Ranking order: `Less` means `a` is featured ahead of `b`.
pub fn rank_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.upvote_count()
        .cmp(&a.upvote_count())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Return the most-upvoted item, or `None` for an empty collection.
pub fn select_most_upvoted(items: &[ContentItem]) -> Option<&ContentItem> {
    items.iter().min_by(|a, b| rank_order(a, b))
}
