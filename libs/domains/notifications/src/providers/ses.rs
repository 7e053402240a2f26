//! AWS SES v2 with static per-tenant credentials.
//!
//! `apiKey` is the access key id, `apiSecret` the secret access key and
//! `configData.region` the SES region.

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client, Config,
    config::{BehaviorVersion, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    types::{Body, Content, Destination, EmailContent, Message},
};
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, FailureReason};
use crate::models::{EmailProviderKind, EmailProviderSetting};

#[derive(Default)]
pub struct SesAdapter;

impl SesAdapter {
    pub fn new() -> Self {
        Self
    }

    fn client(settings: &EmailProviderSetting) -> Result<Client, DeliveryFailure> {
        let secret = settings
            .api_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DeliveryFailure::misconfigured("SES requires apiSecret"))?;
        let region = settings
            .config_str("region")
            .ok_or_else(|| DeliveryFailure::misconfigured("SES requires configData.region"))?;

        let credentials = Credentials::new(&settings.api_key, secret, None, None, "tenant-settings");
        let config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .build();
        Ok(Client::from_conf(config))
    }

    fn content(data: &str) -> Result<Content, DeliveryFailure> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(|e| DeliveryFailure::misconfigured(format!("Invalid SES content: {e}")))
    }
}

fn classify<E, R>(err: SdkError<E, R>) -> DeliveryFailure
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let reason = match &err {
        SdkError::TimeoutError(_) => FailureReason::Timeout,
        SdkError::ServiceError(_) => FailureReason::Rejected,
        _ => FailureReason::Transport,
    };
    DeliveryFailure::new(reason, format!("SES error: {}", DisplayErrorContext(&err)))
}

#[async_trait]
impl EmailAdapter for SesAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Ses
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let client = Self::client(settings)?;

        let mut body = Body::builder();
        if let Some(text) = &message.text {
            body = body.text(Self::content(text)?);
        }
        if let Some(html) = &message.html {
            body = body.html(Self::content(html)?);
        }
        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(Self::content(&message.subject)?)
                    .body(body.build())
                    .build(),
            )
            .build();

        debug!(to = %message.to, subject = %message.subject, "Sending email via AWS SES");

        let mut request = client
            .send_email()
            .from_email_address(message.from_mailbox())
            .destination(Destination::builder().to_addresses(&message.to).build())
            .content(content);
        if let Some(reply_to) = &message.reply_to {
            request = request.reply_to_addresses(reply_to);
        }

        let response = request.send().await.map_err(|e| {
            let failure = classify(e);
            error!(to = %message.to, error = %failure, "Failed to send email via AWS SES");
            failure
        })?;

        let message_id = response.message_id().map(|s| s.to_string());
        info!(to = %message.to, message_id = ?message_id, "Email sent via AWS SES");
        Ok(DeliveryReceipt { message_id })
    }
}
