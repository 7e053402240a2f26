use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ChannelSet, Severity, TenantId, UserId};

/// Input to the dispatch engine. Also the payload of a scheduled dispatch, so it
/// round-trips through JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub tenant_id: TenantId,
    pub recipients: Vec<UserId>,
    pub notification_type: String,
    #[serde(default)]
    pub severity: Severity,
    pub title: String,
    pub message_body: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub delivery_channels: ChannelSet,
    pub created_by: Option<UserId>,
    pub related_module: Option<String>,
    pub related_entity_id: Option<String>,
    pub template_variables: Option<Value>,
    #[serde(default)]
    pub batch_delivery: bool,
}

impl DispatchRequest {
    pub fn new(
        tenant_id: TenantId,
        recipients: Vec<UserId>,
        notification_type: impl Into<String>,
        title: impl Into<String>,
        message_body: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            recipients,
            notification_type: notification_type.into(),
            severity: Severity::default(),
            title: title.into(),
            message_body: message_body.into(),
            link_url: None,
            delivery_channels: ChannelSet::default(),
            created_by: None,
            related_module: None,
            related_entity_id: None,
            template_variables: None,
            batch_delivery: false,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_link(mut self, link_url: Option<String>) -> Self {
        self.link_url = link_url.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_channels(mut self, channels: ChannelSet) -> Self {
        self.delivery_channels = channels;
        self
    }

    pub fn with_creator(mut self, created_by: Option<UserId>) -> Self {
        self.created_by = created_by;
        self
    }
}

/// Body of `POST /mentions`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentionRequest {
    /// Free text; every `@name` token is resolved against display names.
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(url)]
    pub link_url: Option<String>,
    #[validate(length(max = 64))]
    pub related_module: Option<String>,
    #[validate(length(max = 128))]
    pub related_entity_id: Option<String>,
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
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduleStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// A dispatch held back by a trigger's delivery delay.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDispatch {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub trigger_id: Option<Uuid>,
    /// Raw stored request; decoded by the worker so a bad row fails alone.
    pub request: Value,
    pub due_at: DateTime<Utc>,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
