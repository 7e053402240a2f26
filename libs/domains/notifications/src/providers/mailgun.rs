//! Mailgun messages API (form encoded, basic auth).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, send_checked};
use crate::models::{EmailProviderKind, EmailProviderSetting};

const US_BASE_URL: &str = "https://api.mailgun.net";
const EU_BASE_URL: &str = "https://api.eu.mailgun.net";

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: Option<String>,
}

pub struct MailgunAdapter {
    client: Client,
    /// Overrides the region-derived host.
    base_url: Option<String>,
}

impl MailgunAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
        }
    }

    fn base_url<'a>(&'a self, settings: &EmailProviderSetting) -> &'a str {
        match &self.base_url {
            Some(url) => url,
            None if settings
                .config_str("region")
                .is_some_and(|r| r.eq_ignore_ascii_case("eu")) =>
            {
                EU_BASE_URL
            }
            None => US_BASE_URL,
        }
    }
}

#[async_trait]
impl EmailAdapter for MailgunAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Mailgun
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let domain = settings
            .config_str("domain")
            .ok_or_else(|| DeliveryFailure::misconfigured("Mailgun requires configData.domain"))?;

        let mut form: Vec<(&str, String)> = vec![
            ("from", message.from_mailbox()),
            ("to", message.to.clone()),
            ("subject", message.subject.clone()),
        ];
        if let Some(text) = &message.text {
            form.push(("text", text.clone()));
        }
        if let Some(html) = &message.html {
            form.push(("html", html.clone()));
        }
        if let Some(reply_to) = &message.reply_to {
            form.push(("h:Reply-To", reply_to.clone()));
        }

        debug!(to = %message.to, domain, "Sending email via Mailgun");

        let request = self
            .client
            .post(format!("{}/v3/{}/messages", self.base_url(settings), domain))
            .basic_auth("api", Some(&settings.api_key))
            .form(&form);
        let response = send_checked("Mailgun", request)
            .await
            .inspect_err(|e| error!(to = %message.to, error = %e, "Failed to send email via Mailgun"))?;

        let message_id = response.json::<MailgunResponse>().await.ok().and_then(|r| r.id);

        info!(to = %message.to, message_id = ?message_id, "Email sent via Mailgun");
        Ok(DeliveryReceipt { message_id })
    }
}
