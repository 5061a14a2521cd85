use std::sync::Arc;
use std::time::Duration;

use campus_common::config::AppConfig;
use campus_common::db;
use campus_engine::pipeline::DigestJob;
use campus_engine::store::PgStore;
use campus_notifier::dispatch::{DispatchConfig, Dispatcher};
use campus_notifier::mailer::ResendMailer;
use campus_worker::run_lock::{RunGuard, RunLock};
use campus_worker::schedule::DailySchedule;
use campus_worker::scheduler::Scheduler;
use campus_worker::task::DigestTask;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campus_worker=info,campus_engine=info,campus_notifier=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Campus digest worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let schedule = DailySchedule::parse(&config.digest_time, &config.digest_utc_offset)?;

    let api_key = config
        .resend_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("RESEND_API_KEY environment variable is required"))?;
    let email_from = config
        .email_from
        .clone()
        .ok_or_else(|| anyhow::anyhow!("EMAIL_FROM environment variable is required"))?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool));
    let mailer = Arc::new(ResendMailer::new(
        api_key,
        email_from,
        config.resend_api_url.clone(),
    ));
    let dispatcher = Dispatcher::new(
        mailer,
        DispatchConfig {
            concurrency: config.digest_concurrency,
            delivery_timeout: Duration::from_secs(config.digest_delivery_timeout_secs),
        },
    );
    let job = DigestJob::new(store.clone(), store, dispatcher);

    let lock: Option<Arc<dyn RunGuard>> = match &config.redis_url {
        Some(url) => {
            let owner = format!("campus-digest:{}", std::process::id());
            let lock = RunLock::connect(url, owner, config.digest_run_lock_ttl_secs).await?;
            Some(Arc::new(lock))
        }
        None => {
            tracing::info!("REDIS_URL not set, running without a distributed run lock");
            None
        }
    };

    let handle = Scheduler::start(schedule, Arc::new(DigestTask::new(job, lock)));
    tracing::info!(
        time = %config.digest_time,
        utc_offset = %config.digest_utc_offset,
        "Daily digest scheduled"
    );

    if config.digest_run_on_start {
        tracing::info!("DIGEST_RUN_ON_START set, running digest now");
        handle.trigger_now().await;
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping gracefully...");

    handle.stop().await;
    tracing::info!("Campus digest worker stopped.");
    Ok(())
}
