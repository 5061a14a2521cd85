//! Digest pipeline.
//!
//! Runs ranking → recipients → compose → dispatch once. An empty content
//! store or an empty recipient set ends the run early without error. Only a
//! store read failure aborts the run; delivery failures are absorbed by the
//! dispatcher.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use campus_common::error::AppError;
use campus_notifier::dispatch::{DispatchReport, Dispatcher};

use crate::composer::compose_digest;
use crate::recipients::collect_recipients;
use crate::store::{ContentStore, UserStore};

/// Failure that aborts a digest run.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Store unavailable during {stage}: {source}")]
    StoreUnavailable {
        stage: &'static str,
        #[source]
        source: AppError,
    },
}

/// How a run that did not abort ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    /// No content exists to feature.
    NoContent,
    /// No user has a contactable address.
    NoRecipients,
    /// The digest went through the dispatcher.
    Dispatched { item_id: Uuid, report: DispatchReport },
}

/// One daily digest run over the given stores and dispatcher.
pub struct DigestJob {
    content: Arc<dyn ContentStore>,
    users: Arc<dyn UserStore>,
    dispatcher: Dispatcher,
}

impl DigestJob {
    pub fn new(
        content: Arc<dyn ContentStore>,
        users: Arc<dyn UserStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            content,
            users,
            dispatcher,
        }
    }

    /// Run the full pipeline once.
    pub async fn run(&self) -> Result<DigestOutcome, DigestError> {
        let item = self
            .content
            .most_upvoted()
            .await
            .map_err(|source| DigestError::StoreUnavailable {
                stage: "ranking",
                source,
            })?;

        let Some(item) = item else {
            tracing::info!("No content to feature, skipping digest");
            return Ok(DigestOutcome::NoContent);
        };

        tracing::info!(
            item_id = %item.id,
            kind = %item.kind,
            upvotes = item.upvote_count(),
            downvotes = item.downvote_count(),
            "Selected featured item"
        );

        let users = self
            .users
            .all_users()
            .await
            .map_err(|source| DigestError::StoreUnavailable {
                stage: "recipients",
                source,
            })?;

        let recipients = collect_recipients(&users);
        if recipients.is_empty() {
            tracing::info!("No recipients on file, skipping digest");
            return Ok(DigestOutcome::NoRecipients);
        }

        let message = compose_digest(&item);
        tracing::info!(
            recipients = recipients.len(),
            subject = %message.subject,
            "Dispatching digest"
        );

        let report = self.dispatcher.dispatch(&message, &recipients).await;

        Ok(DigestOutcome::Dispatched {
            item_id: item.id,
            report,
        })
    }
}
