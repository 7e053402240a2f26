use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::TenantId;

/// Replaces secrets in every outbound representation.
pub const SECRET_MASK: &str = "********";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EmailProviderKind {
    #[sea_orm(string_value = "SENDGRID")]
    Sendgrid,
    #[sea_orm(string_value = "SMTP")]
    Smtp,
    #[sea_orm(string_value = "MAILGUN")]
    Mailgun,
    #[sea_orm(string_value = "SES")]
    Ses,
    #[sea_orm(string_value = "POSTMARK")]
    Postmark,
    #[sea_orm(string_value = "RESEND")]
    Resend,
}

/// A tenant's credentials for one email vendor. Never serialized directly; see
/// [`EmailProviderView`].
#[derive(Clone, PartialEq)]
pub struct EmailProviderSetting {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub provider: EmailProviderKind,
    pub from_email: String,
    pub from_name: String,
    pub reply_to_email: Option<String>,
    pub api_key: String,
    pub api_secret: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    pub config_data: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for EmailProviderSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailProviderSetting")
            .field("id", &self.id)
            .field("tenant_id", &self.tenant_id)
            .field("provider", &self.provider)
            .field("from_email", &self.from_email)
            .field("api_key", &SECRET_MASK)
            .field("api_secret", &self.api_secret.as_ref().map(|_| SECRET_MASK))
            .field("smtp_host", &self.smtp_host)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl EmailProviderSetting {
    /// New, inactive setting; activation is a separate step.
    pub fn new(tenant_id: TenantId, input: CreateEmailProvider) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            provider: input.provider,
            from_email: input.from_email,
            from_name: input.from_name,
            reply_to_email: input.reply_to_email,
            api_key: input.api_key,
            api_secret: input.api_secret,
            smtp_host: input.smtp_host,
            smtp_port: input.smtp_port,
            smtp_secure: input.smtp_secure,
            config_data: input.config_data,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy with `input` applied. Secrets equal to [`SECRET_MASK`] keep their
    /// stored value, so a masked read can be sent straight back.
    pub fn with_update(&self, input: &UpdateEmailProvider) -> Self {
        let mut next = self.clone();
        if let Some(v) = input.provider {
            next.provider = v;
        }
        if let Some(v) = &input.from_email {
            next.from_email = v.clone();
        }
        if let Some(v) = &input.from_name {
            next.from_name = v.clone();
        }
        if let Some(v) = &input.reply_to_email {
            next.reply_to_email = Some(v.clone()).filter(|s| !s.is_empty());
        }
        if let Some(v) = input.api_key.as_ref().filter(|k| k.as_str() != SECRET_MASK) {
            next.api_key = v.clone();
        }
        if let Some(v) = input.api_secret.as_ref().filter(|k| k.as_str() != SECRET_MASK) {
            next.api_secret = Some(v.clone()).filter(|s| !s.is_empty());
        }
        if let Some(v) = &input.smtp_host {
            next.smtp_host = Some(v.clone()).filter(|s| !s.is_empty());
        }
        if let Some(v) = input.smtp_port {
            next.smtp_port = Some(v);
        }
        if let Some(v) = input.smtp_secure {
            next.smtp_secure = Some(v);
        }
        if let Some(v) = &input.config_data {
            next.config_data = Some(v.clone()).filter(|c| !c.is_null());
        }
        next.updated_at = Utc::now();
        next
    }

    /// String value at `key` inside `configData`, if any.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config_data
            .as_ref()
            .and_then(|c| c.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn masked(&self) -> EmailProviderView {
        EmailProviderView {
            id: self.id,
            provider: self.provider,
            from_email: self.from_email.clone(),
            from_name: self.from_name.clone(),
            reply_to_email: self.reply_to_email.clone(),
            api_key: SECRET_MASK.to_string(),
            api_secret: self.api_secret.as_ref().map(|_| SECRET_MASK.to_string()),
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_secure: self.smtp_secure,
            config_data: self.config_data.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Provider settings as returned over HTTP, secrets masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailProviderView {
    pub id: Uuid,
    pub provider: EmailProviderKind,
    pub from_email: String,
    pub from_name: String,
    pub reply_to_email: Option<String>,
    pub api_key: String,
    pub api_secret: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub config_data: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmailProvider {
    pub provider: EmailProviderKind,
    #[validate(email)]
    pub from_email: String,
    #[validate(length(min = 1, max = 255))]
    pub from_name: String,
    #[validate(email)]
    pub reply_to_email: Option<String>,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub api_secret: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub smtp_host: Option<String>,
    #[validate(range(min = 1, max = 65535))]
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub config_data: Option<Value>,
    /// Activate right away, deactivating the tenant's other providers.
    #[serde(default)]
    pub is_active: bool,
}

/// Partial update. `isActive` toggles activation through the same atomic path
/// as creation.
#[derive(Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmailProvider {
    pub provider: Option<EmailProviderKind>,
    #[validate(email)]
    pub from_email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub from_name: Option<String>,
    pub reply_to_email: Option<String>,
    #[validate(length(min = 1))]
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub smtp_host: Option<String>,
    #[validate(range(min = 1, max = 65535))]
    pub smtp_port: Option<i32>,
    pub smtp_secure: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub config_data: Option<Value>,
    pub is_active: Option<bool>,
}

impl fmt::Debug for CreateEmailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateEmailProvider")
            .field("provider", &self.provider)
            .field("from_email", &self.from_email)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for UpdateEmailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateEmailProvider")
            .field("provider", &self.provider)
            .field("from_email", &self.from_email)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailRequest {
    #[validate(email)]
    pub to_email: String,
}

/// Result of one send attempt as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub success: bool,
    pub error_message: Option<String>,
    pub log_id: Option<Uuid>,
}
