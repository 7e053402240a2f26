//! SMTP delivery using lettre. A transport is built per send from the tenant's
//! settings; the username is the sender address and the password is `apiKey`.
//!
//! `smtpSecure = true` means implicit TLS (usually port 465). Otherwise the
//! connection must be upgraded with STARTTLS before credentials are sent.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, error, info};

use super::{DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, FailureReason};
use crate::models::{EmailProviderKind, EmailProviderSetting};

const DEFAULT_PORT: u16 = 587;

#[derive(Default)]
pub struct SmtpAdapter;

impl SmtpAdapter {
    pub fn new() -> Self {
        Self
    }

    fn transport(
        settings: &EmailProviderSetting,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryFailure> {
        let host = settings
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DeliveryFailure::misconfigured("SMTP requires smtpHost"))?;
        let port = match settings.smtp_port {
            Some(port) => u16::try_from(port)
                .map_err(|_| DeliveryFailure::misconfigured(format!("Invalid SMTP port {port}")))?,
            None => DEFAULT_PORT,
        };
        let creds = Credentials::new(settings.from_email.clone(), settings.api_key.clone());

        let transport = if settings.smtp_secure.unwrap_or(false) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| DeliveryFailure::misconfigured(format!("Invalid SMTP relay: {e}")))?
                .credentials(creds)
                .port(port)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| DeliveryFailure::misconfigured(format!("Invalid SMTP relay: {e}")))?
                .credentials(creds)
                .port(port)
                .build()
        };
        Ok(transport)
    }

    fn build_message(message: &EmailMessage) -> Result<Message, DeliveryFailure> {
        let parse = |what: &str, value: &str| -> Result<Mailbox, DeliveryFailure> {
            value
                .parse()
                .map_err(|e| DeliveryFailure::misconfigured(format!("Invalid {what} address: {e}")))
        };

        let mut builder = Message::builder()
            .from(parse("from", &message.from_mailbox())?)
            .to(parse("to", &message.to)?)
            .subject(&message.subject);
        if let Some(reply_to) = &message.reply_to {
            builder = builder.reply_to(parse("reply-to", reply_to)?);
        }

        let built = match (&message.text, &message.html) {
            (Some(text), Some(html)) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            ),
            (Some(text), None) => builder.header(ContentType::TEXT_PLAIN).body(text.clone()),
            (None, Some(html)) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
            (None, None) => {
                return Err(DeliveryFailure::misconfigured("Email has no body"));
            }
        };
        built.map_err(|e| DeliveryFailure::misconfigured(format!("Failed to build message: {e}")))
    }
}

#[async_trait]
impl EmailAdapter for SmtpAdapter {
    fn kind(&self) -> EmailProviderKind {
        EmailProviderKind::Smtp
    }

    async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        let transport = Self::transport(settings)?;
        let email = Self::build_message(message)?;

        debug!(to = %message.to, host = ?settings.smtp_host, "Sending email via SMTP");

        let response = transport.send(email).await.map_err(|e| {
            error!(to = %message.to, error = %e, "Failed to send email via SMTP");
            DeliveryFailure::new(FailureReason::Transport, format!("SMTP error: {e}"))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(to = %message.to, "Email sent via SMTP");
        Ok(DeliveryReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fixtures::{message, settings};
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Accepts one SMTP session that advertises STARTTLS but cannot negotiate it,
    /// returning every command the client sent.
    async fn starttls_only_server() -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut commands = Vec::new();
            write.write_all(b"220 mail.acme.test ESMTP\r\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let command = line.trim().to_string();
                let upper = command.to_ascii_uppercase();
                commands.push(command);
                let reply: &[u8] = if upper.starts_with("EHLO") {
                    b"250-mail.acme.test\r\n250-STARTTLS\r\n250 AUTH PLAIN LOGIN\r\n"
                } else if upper.starts_with("STARTTLS") {
                    b"454 4.7.0 TLS not available\r\n"
                } else if upper.starts_with("QUIT") {
                    b"221 bye\r\n"
                } else {
                    b"250 OK\r\n"
                };
                if write.write_all(reply).await.is_err() || upper.starts_with("QUIT") {
                    break;
                }
            }
            commands
        });
        (port, handle)
    }

    #[tokio::test]
    async fn plain_port_upgrades_with_starttls_before_auth() {
        let (port, server) = starttls_only_server().await;
        let settings = settings(
            "SMTP",
            json!({ "smtpHost": "127.0.0.1", "smtpPort": port, "smtpSecure": false }),
        );

        let failure = SmtpAdapter::new()
            .send(&settings, &message(&settings))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::Transport);

        let commands = server.await.unwrap();
        assert!(
            commands.iter().any(|c| c.eq_ignore_ascii_case("STARTTLS")),
            "client never asked for STARTTLS: {commands:?}"
        );
        assert!(
            !commands.iter().any(|c| c.to_ascii_uppercase().starts_with("AUTH")),
            "credentials sent without TLS: {commands:?}"
        );
    }

    #[tokio::test]
    async fn missing_host_is_misconfigured() {
        let settings = settings("SMTP", json!({}));
        let failure = SmtpAdapter::new()
            .send(&settings, &message(&settings))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::Misconfigured);
        assert!(failure.message.contains("smtpHost"));
    }

    #[test]
    fn out_of_range_port_is_misconfigured() {
        let settings = settings("SMTP", json!({ "smtpHost": "smtp.acme.test", "smtpPort": 70000 }));
        let failure = SmtpAdapter::transport(&settings).err().unwrap();
        assert_eq!(failure.reason, FailureReason::Misconfigured);
    }

    #[test]
    fn builds_multipart_with_reply_to() {
        let settings = settings("SMTP", json!({ "smtpHost": "smtp.acme.test" }));
        let email = SmtpAdapter::build_message(&message(&settings)).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Reply-To: support@acme.test"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Invoice created"));
    }

    #[test]
    fn rejects_malformed_recipient() {
        let settings = settings("SMTP", json!({ "smtpHost": "smtp.acme.test" }));
        let mut msg = message(&settings);
        msg.to = "not an address".into();
        let failure = SmtpAdapter::build_message(&msg).unwrap_err();
        assert_eq!(failure.reason, FailureReason::Misconfigured);
    }
}
