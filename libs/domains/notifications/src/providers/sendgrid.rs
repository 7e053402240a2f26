//! SendGrid v3 mail send.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, send_checked};
use crate::models::{EmailProviderKind, EmailProviderSetting};

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: EmailAddress<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress<'a>>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<EmailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

pub struct SendGridAdapter {
    client: Client,
    base_url: String,
}

impl SendGridAdapter {
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
impl EmailAdapter for SendGridAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Sendgrid
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        // SendGrid requires text/plain before text/html.
        let mut content = Vec::new();
        if let Some(text) = &message.text {
            content.push(Content {
                content_type: "text/plain",
                value: text,
            });
        }
        if let Some(html) = &message.html {
            content.push(Content {
                content_type: "text/html",
                value: html,
            });
        }

        let request = SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: &message.to,
                    name: None,
                }],
            }],
            from: EmailAddress {
                email: &message.from_email,
                name: Some(message.from_name.as_str()).filter(|n| !n.is_empty()),
            },
            reply_to: message.reply_to.as_deref().map(|email| EmailAddress { email, name: None }),
            subject: &message.subject,
            content,
        };

        debug!(to = %message.to, subject = %message.subject, "Sending email via SendGrid");

        let request = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&settings.api_key)
            .json(&request);
        let response = send_checked("SendGrid", request)
            .await
            .inspect_err(|e| error!(to = %message.to, error = %e, "Failed to send email via SendGrid"))?;

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        info!(to = %message.to, message_id = ?message_id, "Email sent via SendGrid");
        Ok(DeliveryReceipt { message_id })
    }
}
