use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of discussion unit eligible for the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ContentKind {
    Thread,
    Post,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Thread => write!(f, "thread"),
            ContentKind::Post => write!(f, "post"),
        }
    }
}

/// A user-authored thread or post.
///
/// A voter id never appears in both `upvoters` and `downvoters`; the vote
/// toggles below keep that true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub upvoters: Vec<Uuid>,
    pub downvoters: Vec<Uuid>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a vote on a [`ContentItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl ContentItem {
    /// Number of distinct upvoters.
    pub fn upvote_count(&self) -> usize {
        self.upvoters.iter().collect::<HashSet<_>>().len()
    }

    /// Number of distinct downvoters.
    pub fn downvote_count(&self) -> usize {
        self.downvoters.iter().collect::<HashSet<_>>().len()
    }

    /// Upvote, or withdraw an existing upvote.
    pub fn toggle_upvote(&mut self, user_id: Uuid) {
        self.toggle_vote(user_id, VoteDirection::Up);
    }

    /// Downvote, or withdraw an existing downvote.
    pub fn toggle_downvote(&mut self, user_id: Uuid) {
        self.toggle_vote(user_id, VoteDirection::Down);
    }

    /// Apply a vote toggle.
    ///
    /// Voting the same way twice removes the vote. Voting the opposite way
    /// moves the vote to the other set.
    pub fn toggle_vote(&mut self, user_id: Uuid, direction: VoteDirection) {
        let (same, opposite) = match direction {
            VoteDirection::Up => (&mut self.upvoters, &mut self.downvoters),
            VoteDirection::Down => (&mut self.downvoters, &mut self.upvoters),
        };

        opposite.retain(|id| *id != user_id);

        if same.contains(&user_id) {
            same.retain(|id| *id != user_id);
        } else {
            same.push(user_id);
        }
    }
}

/// A registered user. Read-only for the digest.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// The composed daily digest. Derived from one [`ContentItem`], never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestMessage {
    pub subject: String,
    pub body: String,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    TimedOut,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}
