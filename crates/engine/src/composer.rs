//! Digest composer: renders the featured item into a [`DigestMessage`].
//!
//! Pure and deterministic: no clock, locale, or timezone input.

use campus_common::types::{ContentItem, DigestMessage};

/// Subject prefix of every digest.
pub const SUBJECT_PREFIX: &str = "Thread of the Day: ";
/// Shown in place of an empty body.
pub const NO_CONTENT_PLACEHOLDER: &str = "No content";
/// Shown in place of an empty tag list.
pub const NO_TAGS_PLACEHOLDER: &str = "No tags";
/// Separator between tags.
pub const TAG_SEPARATOR: &str = ", ";

/// Compose the daily digest for `item`.
pub fn compose_digest(item: &ContentItem) -> DigestMessage {
    let content = if item.body.trim().is_empty() {
        NO_CONTENT_PLACEHOLDER
    } else {
        item.body.as_str()
    };

    let tags = if item.tags.is_empty() {
        NO_TAGS_PLACEHOLDER.to_string()
    } else {
        item.tags.join(TAG_SEPARATOR)
    };

    let body = [
        format!("Title: {}", item.title),
        format!("Content: {}", content),
        format!("Upvotes: {}", item.upvote_count()),
        format!("Tags: {}", tags),
    ]
    .join("\n");

    DigestMessage {
        subject: format!("{}{}", SUBJECT_PREFIX, item.title),
        body,
    }
}
