//! Dispatch loop: delivers one digest to every recipient.
//!
//! Each recipient is attempted exactly once. A failed or stuck delivery is
//! logged and tallied; it never stops attempts to the remaining recipients
//! and never fails the dispatch as a whole. There is no retry.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;

use campus_common::types::{DeliveryStatus, DigestMessage};

use crate::mailer::{DeliveryError, Mailer};

/// Default per-delivery timeout in seconds.
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 30;

/// Dispatch tuning.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Deliveries in flight at once. `1` delivers sequentially.
    pub concurrency: usize,
    /// Upper bound on a single delivery.
    pub delivery_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            delivery_timeout: Duration::from_secs(DEFAULT_DELIVERY_TIMEOUT_SECS),
        }
    }
}

/// Tally of a dispatch run. Used for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl DispatchReport {
    fn record(&mut self, status: DeliveryStatus) {
        self.attempted += 1;
        match status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::TimedOut => self.timed_out += 1,
        }
    }
}

/// Delivers a [`DigestMessage`] through a [`Mailer`].
#[derive(Clone)]
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, config: DispatchConfig) -> Self {
        Self { mailer, config }
    }

    /// Attempt delivery of `message` to every address in `recipients`.
    pub async fn dispatch(&self, message: &DigestMessage, recipients: &[String]) -> DispatchReport {
        let concurrency = self.config.concurrency.max(1);

        // Build the futures up front; a borrowing closure inside the stream
        // makes the returned future fail the `Send` check behind async-trait.
        let deliveries: Vec<_> = recipients
            .iter()
            .map(|recipient| self.deliver(message, recipient))
            .collect();

        let statuses: Vec<DeliveryStatus> = stream::iter(deliveries)
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = DispatchReport::default();
        for status in statuses {
            report.record(status);
        }

        tracing::info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            timed_out = report.timed_out,
            "Digest dispatch finished"
        );

        report
    }

    async fn deliver(&self, message: &DigestMessage, recipient: &str) -> DeliveryStatus {
        let timeout = self.config.delivery_timeout;
        let attempt = self.mailer.send(recipient, &message.subject, &message.body);

        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        };

        match result {
            Ok(()) => {
                tracing::debug!(recipient, "Digest delivered");
                DeliveryStatus::Sent
            }
            Err(e @ DeliveryError::Timeout(_)) => {
                tracing::warn!(recipient, error = %e, "Digest delivery timed out");
                DeliveryStatus::TimedOut
            }
            Err(e) => {
                tracing::warn!(recipient, error = %e, "Digest delivery failed");
                DeliveryStatus::Failed
            }
        }
    }
}
