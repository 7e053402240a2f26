use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{TenantId, UserId};

static HH_MM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

fn validate_hh_mm(value: &str) -> Result<(), ValidationError> {
    if !HH_MM.is_match(value) {
        return Err(ValidationError::new("invalid_time").with_message("expected HH:MM".into()));
    }
    Ok(())
}

fn validate_quiet_window(input: &UpdatePreference) -> Result<(), ValidationError> {
    if input.quiet_hours && (input.quiet_start.is_none() || input.quiet_end.is_none()) {
        return Err(ValidationError::new("quiet_window")
            .with_message("quietStart and quietEnd are required when quietHours is on".into()));
    }
    Ok(())
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DigestFrequency {
    #[default]
    #[sea_orm(string_value = "immediate")]
    Immediate,
    #[sea_orm(string_value = "hourly")]
    Hourly,
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
}

/// Stored channel choices for one (tenant, user, notification type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub notification_type: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub digest_frequency: DigestFrequency,
    pub quiet_hours: bool,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            user_id,
            notification_type: notification_type.to_string(),
            in_app_enabled: input.in_app_enabled,
            email_enabled: input.email_enabled,
            digest_frequency: input.digest_frequency,
            quiet_hours: input.quiet_hours,
            quiet_start: input.quiet_start,
            quiet_end: input.quiet_end,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdatePreference) {
        self.in_app_enabled = input.in_app_enabled;
        self.email_enabled = input.email_enabled;
        self.digest_frequency = input.digest_frequency;
        self.quiet_hours = input.quiet_hours;
        self.quiet_start = input.quiet_start;
        self.quiet_end = input.quiet_end;
        self.updated_at = Utc::now();
    }
}

/// Body of `PUT /preferences/{type}`. Replaces the stored row wholesale.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_quiet_window", skip_on_field_errors = false))]
pub struct UpdatePreference {
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    #[serde(default)]
    pub digest_frequency: DigestFrequency,
    #[serde(default)]
    pub quiet_hours: bool,
    #[validate(custom(function = "validate_hh_mm"))]
    pub quiet_start: Option<String>,
    #[validate(custom(function = "validate_hh_mm"))]
    pub quiet_end: Option<String>,
}

/// What a user actually gets for one notification type, defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePreference {
    pub notification_type: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub digest_frequency: DigestFrequency,
    pub quiet_hours: bool,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    /// True when no row is stored and defaults apply.
    pub is_default: bool,
}

impl EffectivePreference {
    pub fn defaults(notification_type: &str) -> Self {
        Self {
            notification_type: notification_type.to_string(),
            in_app_enabled: true,
            email_enabled: false,
            digest_frequency: DigestFrequency::Immediate,
            quiet_hours: false,
            quiet_start: None,
            quiet_end: None,
            is_default: true,
        }
    }
}

impl From<NotificationPreference> for EffectivePreference {
    fn from(p: NotificationPreference) -> Self {
        Self {
            notification_type: p.notification_type,
            in_app_enabled: p.in_app_enabled,
            email_enabled: p.email_enabled,
            digest_frequency: p.digest_frequency,
            quiet_hours: p.quiet_hours,
            quiet_start: p.quiet_start,
            quiet_end: p.quiet_end,
            is_default: false,
        }
    }
}

/// Recipients per channel after preferences are applied. The sets may overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eligibility {
    pub in_app: Vec<UserId>,
    pub email: Vec<UserId>,
}

impl Eligibility {
    pub fn is_empty(&self) -> bool {
        self.in_app.is_empty() && self.email.is_empty()
    }
}
