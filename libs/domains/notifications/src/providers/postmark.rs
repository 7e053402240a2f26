//! Postmark single email API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, send_checked};
use crate::models::{EmailProviderKind, EmailProviderSetting};

const DEFAULT_BASE_URL: &str = "https://api.postmarkapp.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkRequest<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    message_stream: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostmarkResponse {
    #[serde(rename = "MessageID")]
    message_id: Option<String>,
}

pub struct PostmarkAdapter {
    client: Client,
    base_url: String,
}

impl PostmarkAdapter {
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
impl EmailAdapter for PostmarkAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Postmark
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let body = PostmarkRequest {
            from: message.from_mailbox(),
            to: &message.to,
            subject: &message.subject,
            text_body: message.text.as_deref(),
            html_body: message.html.as_deref(),
            reply_to: message.reply_to.as_deref(),
            message_stream: settings.config_str("messageStream").unwrap_or("outbound"),
        };

        debug!(to = %message.to, subject = %message.subject, "Sending email via Postmark");

        let request = self
            .client
            .post(format!("{}/email", self.base_url))
            .header("Accept", "application/json")
            .header("X-Postmark-Server-Token", &settings.api_key)
            .json(&body);
        let response = send_checked("Postmark", request)
            .await
            .inspect_err(|e| error!(to = %message.to, error = %e, "Failed to send email via Postmark"))?;

        let message_id = response
            .json::<PostmarkResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);

        info!(to = %message.to, message_id = ?message_id, "Email sent via Postmark");
        Ok(DeliveryReceipt { message_id })
    }
}
