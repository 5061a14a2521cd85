//! Mail transport port and the Resend HTTP adapter.
//!
//! The dispatcher only sees [`Mailer`]; credentials reach [`ResendMailer`]
//! through its constructor, resolved from `AppConfig` at startup.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Failure to deliver one message to one recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one plain-text message to one recipient.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// [`Mailer`] backed by the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.base_url)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [to],
            subject,
            text: body,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(recipient = to, "Mail API accepted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_json_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test_key"))
            .and(body_json(serde_json::json!({
                "from": "digest@campus.test",
                "to": ["a@x.com"],
                "subject": "Thread of the Day: B",
                "text": "hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = ResendMailer::new(
            "re_test_key".to_string(),
            "digest@campus.test".to_string(),
            format!("{}/", server.uri()),
        );
        mailer
            .send("a@x.com", "Thread of the Day: B", "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_non_success_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid `to` field"))
            .mount(&server)
            .await;

        let mailer = ResendMailer::new(
            "re_test_key".to_string(),
            "digest@campus.test".to_string(),
            server.uri(),
        );
        let err = mailer.send("not-an-address", "s", "b").await.unwrap_err();
        match err {
            DeliveryError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("invalid"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
