use std::str::FromStr;

use serde::Deserialize;

/// Digest worker configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 5)
    pub db_max_connections: u32,

    /// Redis connection string. When set, runs take a distributed lock so
    /// that only one worker replica sends the digest.
    pub redis_url: Option<String>,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Resend API base URL (default: https://api.resend.com)
    pub resend_api_url: String,

    /// Email sender address
    pub email_from: Option<String>,

    /// Wall-clock trigger time, `HH:MM` (default: 08:00)
    pub digest_time: String,

    /// Fixed timezone of the trigger, `±HH:MM` (default: +00:00)
    pub digest_utc_offset: String,

    /// Number of deliveries in flight at once (default: 1, sequential)
    pub digest_concurrency: usize,

    /// Per-delivery timeout in seconds (default: 30)
    pub digest_delivery_timeout_secs: u64,

    /// Expiry of the distributed run lock in seconds (default: 3600)
    pub digest_run_lock_ttl_secs: u64,

    /// Run the digest once immediately at startup, in addition to the schedule
    pub digest_run_on_start: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let optional = |key: &str| lookup(key).filter(|s| !s.is_empty());

        Ok(Self {
            database_url: optional("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 5, "u32")?,
            redis_url: optional("REDIS_URL"),
            resend_api_key: optional("RESEND_API_KEY"),
            resend_api_url: lookup("RESEND_API_URL")
                .unwrap_or_else(|| "https://api.resend.com".to_string()),
            email_from: optional("EMAIL_FROM"),
            digest_time: lookup("DIGEST_TIME").unwrap_or_else(|| "08:00".to_string()),
            digest_utc_offset: lookup("DIGEST_UTC_OFFSET")
                .unwrap_or_else(|| "+00:00".to_string()),
            digest_concurrency: parse_var(&lookup, "DIGEST_CONCURRENCY", 1, "usize")?,
            digest_delivery_timeout_secs: parse_var(
                &lookup,
                "DIGEST_DELIVERY_TIMEOUT_SECS",
                30,
                "u64",
            )?,
            digest_run_lock_ttl_secs: parse_var(&lookup, "DIGEST_RUN_LOCK_TTL_SECS", 3600, "u64")?,
            digest_run_on_start: parse_var(&lookup, "DIGEST_RUN_ON_START", false, "bool")?,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    type_name: &str,
) -> anyhow::Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid {type_name}, got '{raw}'")),
        None => Ok(default),
    }
}
