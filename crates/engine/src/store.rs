//! Read-only store ports used by the digest, with PostgreSQL and in-memory
//! implementations.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;

use campus_common::error::AppError;
use campus_common::types::{ContentItem, User};

use crate::ranking::select_most_upvoted;

/// Source of content items for the ranking selector.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The most-upvoted item, or `None` when no content exists.
    async fn most_upvoted(&self) -> Result<Option<ContentItem>, AppError>;
}

/// Source of users for the recipient enumerator.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn all_users(&self) -> Result<Vec<User>, AppError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn most_upvoted(&self) -> Result<Option<ContentItem>, AppError> {
        // Same order as `ranking::rank_order`.
        let item: Option<ContentItem> = sqlx::query_as(
            r#"
            SELECT c.id, c.kind, c.title, c.body, c.upvoters, c.downvoters, c.tags, c.created_at
            FROM content_items c
            ORDER BY (SELECT COUNT(DISTINCT v) FROM unnest(c.upvoters) AS v) DESC,
                     c.created_at ASC,
                     c.id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn all_users(&self) -> Result<Vec<User>, AppError> {
        let users: Vec<User> =
            sqlx::query_as("SELECT id, email, display_name, created_at FROM users")
                .fetch_all(&self.pool)
                .await?;

        Ok(users)
    }
}

/// In-memory store for tests and local dry runs.
///
/// `set_unavailable(true)` makes every read fail, standing in for a store
/// outage.
#[derive(Default)]
pub struct MemoryStore {
    items: Vec<ContentItem>,
    users: Vec<User>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new(items: Vec<ContentItem>, users: Vec<User>) -> Self {
        Self {
            items,
            users,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn most_upvoted(&self) -> Result<Option<ContentItem>, AppError> {
        self.check_available()?;
        Ok(select_most_upvoted(&self.items).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn all_users(&self) -> Result<Vec<User>, AppError> {
        self.check_available()?;
        Ok(self.users.clone())
    }
}
