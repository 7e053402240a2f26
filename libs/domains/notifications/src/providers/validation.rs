use validator::ValidateEmail;

use crate::models::{EmailProviderKind, EmailProviderSetting, ProviderValidation};

/// Checks that `settings` carry everything their vendor needs. Runs before
/// persisting and before every send.
pub fn validate_settings(settings: &EmailProviderSetting) -> ProviderValidation {
    let mut errors = Vec::new();

    if !settings.from_email.validate_email() {
        errors.push("From email is not a valid email address".to_string());
    }
    if settings.from_name.trim().is_empty() {
        errors.push("From name is required".to_string());
    }
    if settings.api_key.trim().is_empty() {
        errors.push("API key is required".to_string());
    }
    if settings
        .reply_to_email
        .as_deref()
        .is_some_and(|r| !r.validate_email())
    {
        errors.push("Reply-to email is not a valid email address".to_string());
    }

    match settings.provider {
        EmailProviderKind::Smtp => {
            if settings.smtp_host.as_deref().is_none_or(|h| h.trim().is_empty()) {
                errors.push("SMTP host is required".to_string());
            }
            match settings.smtp_port {
                None => errors.push("SMTP port is required".to_string()),
                Some(port) if !(1..=65535).contains(&port) => {
                    errors.push("SMTP port must be between 1 and 65535".to_string())
                }
                Some(_) => {}
            }
        }
        EmailProviderKind::Mailgun => {
            if settings.config_str("domain").is_none() {
                errors.push("Mailgun domain is required in configData".to_string());
            }
        }
        EmailProviderKind::Ses => {
            if settings.api_secret.as_deref().is_none_or(|s| s.trim().is_empty()) {
                errors.push("AWS secret access key is required".to_string());
            }
            if settings.config_str("region").is_none() {
                errors.push("AWS region is required in configData".to_string());
            }
        }
        EmailProviderKind::Sendgrid | EmailProviderKind::Postmark | EmailProviderKind::Resend => {}
    }

    ProviderValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fixtures::settings;
    use serde_json::json;

    #[test]
    fn complete_sendgrid_settings_are_valid() {
        let result = validate_settings(&settings("SENDGRID", json!({})));
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn smtp_requires_host_and_port() {
        let result = validate_settings(&settings("SMTP", json!({})));
        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            vec!["SMTP host is required", "SMTP port is required"]
        );

        let ok = settings("SMTP", json!({ "smtpHost": "smtp.acme.test", "smtpPort": 465 }));
        assert!(validate_settings(&ok).is_valid);
    }

    #[test]
    fn mailgun_requires_domain() {
        let result = validate_settings(&settings("MAILGUN", json!({})));
        assert_eq!(result.errors, vec!["Mailgun domain is required in configData"]);
    }

    #[test]
    fn ses_requires_secret_and_region() {
        let result = validate_settings(&settings("SES", json!({})));
        assert_eq!(result.errors.len(), 2);

        let ok = settings("SES", json!({ "apiSecret": "s", "configData": { "region": "us-east-1" } }));
        assert!(validate_settings(&ok).is_valid);
    }

    #[test]
    fn collects_common_field_errors() {
        let mut bad = settings("RESEND", json!({}));
        bad.from_email = "nope".into();
        bad.api_key = " ".into();
        bad.reply_to_email = Some("also nope".into());
        let result = validate_settings(&bad);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }
}
