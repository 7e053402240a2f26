//! Resend emails API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, send_checked};
use crate::models::{EmailProviderKind, EmailProviderSetting};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

pub struct ResendAdapter {
    client: Client,
    base_url: String,
}

impl ResendAdapter {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmailAdapter for ResendAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Resend
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let body = ResendRequest {
            from: message.from_mailbox(),
            to: [&message.to],
            subject: &message.subject,
            html: message.html.as_deref(),
            text: message.text.as_deref(),
            reply_to: message.reply_to.as_deref(),
        };

        debug!(to = %message.to, subject = %message.subject, "Sending email via Resend");

        let request = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&settings.api_key)
            .json(&body);
        let response = send_checked("Resend", request)
            .await
            .inspect_err(|e| error!(to = %message.to, error = %e, "Failed to send email via Resend"))?;

        let message_id = response.json::<ResendResponse>().await.ok().and_then(|r| r.id);

        info!(to = %message.to, message_id = ?message_id, "Email sent via Resend");
        Ok(DeliveryReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::FailureReason;
    use crate::providers::capture::CaptureServer;
    use crate::providers::fixtures::{message, settings};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn posts_bearer_json() {
        let server = CaptureServer::start(StatusCode::OK, r#"{"id":"re_1"}"#).await;
        let adapter = ResendAdapter::with_base_url(Client::new(), &server.base_url);
        let settings = settings("RESEND", json!({}));

        let receipt = adapter.send(&settings, &message(&settings)).await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("re_1"));

        let request = server.single();
        assert_eq!(request.path, "/emails");
        assert_eq!(request.header("authorization"), "Bearer key-123");
        let body = request.json();
        assert_eq!(body["to"], json!(["user@acme.test"]));
        assert_eq!(body["from"], "Acme <noreply@acme.test>");
        assert_eq!(body["reply_to"], "support@acme.test");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let adapter = ResendAdapter::with_base_url(Client::new(), "http://127.0.0.1:9");
        let settings = settings("RESEND", json!({}));

        let failure = adapter.send(&settings, &message(&settings)).await.unwrap_err();
        assert_eq!(failure.reason, FailureReason::Transport);
    }
}
