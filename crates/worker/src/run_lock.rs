//! Run lock shared by worker replicas.
//!
//! The first replica to `SET digest:run_lock <owner> NX EX ttl` runs the
//! digest; the others see the key and skip. After a completed run the key is
//! left to expire, so the lock also suppresses a second run from any replica
//! within `ttl`. A run that aborts releases the key so a healthy replica can
//! still send the day's digest.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use campus_common::error::AppError;

/// Redis key holding the run lock.
pub const RUN_LOCK_KEY: &str = "digest:run_lock";

/// Default lock expiry in seconds (1 hour).
pub const DEFAULT_RUN_LOCK_TTL_SECS: u64 = 3600;

/// Deletes the key only while it still holds this owner's value.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Mutual exclusion for a digest run across replicas.
#[async_trait]
pub trait RunGuard: Send + Sync {
    /// `true` if this replica now holds the lock, `false` if another does.
    async fn try_acquire(&self) -> Result<bool, AppError>;

    /// Give the lock back if this replica still holds it.
    async fn release(&self) -> Result<(), AppError>;
}

/// Redis-backed [`RunGuard`].
#[derive(Clone)]
pub struct RunLock {
    redis: ConnectionManager,
    owner: String,
    ttl_secs: u64,
}

impl RunLock {
    /// Connect to Redis. `owner` is stored as the lock value.
    pub async fn connect(redis_url: &str, owner: String, ttl_secs: u64) -> Result<Self, AppError> {
        let client = Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        tracing::info!(owner = %owner, ttl_secs, "Connected to Redis for run lock");
        Ok(Self {
            redis,
            owner,
            ttl_secs: if ttl_secs == 0 {
                DEFAULT_RUN_LOCK_TTL_SECS
            } else {
                ttl_secs
            },
        })
    }
}

#[async_trait]
impl RunGuard for RunLock {
    async fn try_acquire(&self) -> Result<bool, AppError> {
        let mut redis = self.redis.clone();

        // SET key owner NX EX ttl
        // Some("OK") if the key was set, None if it already exists
        let result: Option<String> = redis::cmd("SET")
            .arg(RUN_LOCK_KEY)
            .arg(&self.owner)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut redis)
            .await?;

        let acquired = result.is_some();
        if !acquired {
            tracing::info!(
                key = RUN_LOCK_KEY,
                ttl_secs = self.ttl_secs,
                "Run lock held elsewhere"
            );
        }

        Ok(acquired)
    }

    async fn release(&self) -> Result<(), AppError> {
        let mut redis = self.redis.clone();

        let deleted: i64 = Script::new(RELEASE_SCRIPT)
            .key(RUN_LOCK_KEY)
            .arg(&self.owner)
            .invoke_async(&mut redis)
            .await?;

        tracing::info!(key = RUN_LOCK_KEY, released = deleted == 1, "Run lock released");
        Ok(())
    }
}
