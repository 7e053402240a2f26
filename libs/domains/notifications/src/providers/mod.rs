//! Email vendor adapters.
//!
//! Each adapter speaks one vendor's API and receives the tenant's
//! [`EmailProviderSetting`] on every call, so a single instance serves all
//! tenants. [`ProviderRegistry`] maps [`EmailProviderKind`] to its adapter.

mod mailgun;
mod postmark;
mod registry;
mod resend;
mod sendgrid;
mod ses;
mod smtp;
mod validation;

pub use mailgun::MailgunAdapter;
pub use postmark::PostmarkAdapter;
pub use registry::ProviderRegistry;
pub use resend::ResendAdapter;
pub use sendgrid::SendGridAdapter;
pub use ses::SesAdapter;
pub use smtp::SmtpAdapter;
pub use validation::validate_settings;

use async_trait::async_trait;
use strum::Display;
use thiserror::Error;

use crate::models::{EmailProviderKind, EmailProviderSetting};
use crate::templates::RenderedEmail;

/// One outbound email, sender fields taken from the provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub from_email: String,
    pub from_name: String,
    pub reply_to: Option<String>,
}

impl EmailMessage {
    pub fn new(settings: &EmailProviderSetting, to: &str, email: RenderedEmail) -> Self {
        Self {
            to: to.to_string(),
            subject: email.subject,
            text: Some(email.text),
            html: Some(email.html),
            from_email: settings.from_email.clone(),
            from_name: settings.from_name.clone(),
            reply_to: settings.reply_to_email.clone(),
        }
    }

    /// `Name <address>`, or the bare address without a name.
    pub fn from_mailbox(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_email.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_email)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Vendor message id, when the vendor returns one.
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    /// The vendor answered and refused the message.
    Rejected,
    /// Network or protocol failure before the vendor answered.
    Transport,
    /// Settings are incomplete for this vendor.
    Misconfigured,
    /// No adapter is registered for the vendor.
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct DeliveryFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl DeliveryFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Misconfigured, message)
    }

    pub fn timeout() -> Self {
        Self::new(FailureReason::Timeout, "timeout")
    }

    /// Text stored in the delivery log.
    pub fn log_message(&self) -> String {
        match self.reason {
            FailureReason::Timeout => "timeout".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for DeliveryFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout()
        } else {
            Self::new(FailureReason::Transport, err.to_string())
        }
    }
}

/// Sends through one vendor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailAdapter: Send + Sync {
    fn kind(&self) -> EmailProviderKind;

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure>;
}

/// Sends `request`; non-2xx responses become [`FailureReason::Rejected`] carrying
/// the vendor's body.
async fn send_checked(
    vendor: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, DeliveryFailure> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryFailure::new(
        FailureReason::Rejected,
        format!("{vendor} error ({status}): {body}"),
    ))
}


#[cfg(test)]
pub(crate) mod fixtures {
    use super::EmailMessage;
    use crate::models::{CreateEmailProvider, EmailProviderSetting};
    use serde_json::{Value, json};

    pub fn settings(provider: &str, extra: Value) -> EmailProviderSetting {
        let mut body = json!({
            "provider": provider,
            "fromEmail": "noreply@acme.test",
            "fromName": "Acme",
            "replyToEmail": "support@acme.test",
            "apiKey": "key-123"
        });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), extra) {
            target.extend(extra);
        }
        let input: CreateEmailProvider = serde_json::from_value(body).unwrap();
        EmailProviderSetting::new(5, input)
    }

    pub fn message(settings: &EmailProviderSetting) -> EmailMessage {
        EmailMessage {
            to: "user@acme.test".into(),
            subject: "Invoice created".into(),
            text: Some("Invoice INV-7 was created".into()),
            html: Some("<p>Invoice INV-7 was created</p>".into()),
            from_email: settings.from_email.clone(),
            from_name: settings.from_name.clone(),
            reply_to: settings.reply_to_email.clone(),
        }
    }
}
