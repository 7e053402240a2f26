use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter, FromJsonQueryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{TenantId, UserId, default_limit, default_page};

/// Notification types the host application emits today. Any other string is
/// accepted; this list only seeds the preferences view.
pub const KNOWN_NOTIFICATION_TYPES: [&str; 8] = [
    "TASK_ASSIGNMENT",
    "TASK_OVERDUE",
    "INVOICE_CREATED",
    "INVOICE_OVERDUE",
    "PAYMENT_RECEIVED",
    "STATUS_CHANGE",
    "MENTION",
    "SYSTEM",
];

pub const MENTION_TYPE: &str = "MENTION";

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
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    #[sea_orm(string_value = "INFO")]
    Info,
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "WARNING")]
    Warning,
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

/// Delivery channel a notification may use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
}

/// Set of channels, stored as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct ChannelSet(pub Vec<Channel>);

impl ChannelSet {
    pub fn new(channels: impl IntoIterator<Item = Channel>) -> Self {
        let mut set = Vec::new();
        for channel in channels {
            if !set.contains(&channel) {
                set.push(channel);
            }
        }
        Self(set)
    }

    pub fn in_app_only() -> Self {
        Self(vec![Channel::InApp])
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.0.contains(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both channels; preferences decide who actually gets what.
impl Default for ChannelSet {
    fn default() -> Self {
        Self(vec![Channel::InApp, Channel::Email])
    }
}

/// A persisted in-app notification for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub title: String,
    pub message_body: String,
    pub link_url: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub severity: Severity,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub related_module: Option<String>,
    pub related_entity_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub template_variables: Option<Value>,
}

/// Row to insert; produced by the dispatch engine per eligible recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub title: String,
    pub message_body: String,
    pub link_url: Option<String>,
    pub notification_type: String,
    pub severity: Severity,
    pub created_by: Option<UserId>,
    pub related_module: Option<String>,
    pub related_entity_id: Option<String>,
    pub template_variables: Option<Value>,
}

impl Notification {
    pub fn from_new(input: NewNotification) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: input.tenant_id,
            user_id: input.user_id,
            title: input.title,
            message_body: input.message_body,
            link_url: input.link_url,
            notification_type: input.notification_type,
            severity: input.severity,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
            created_by: input.created_by,
            related_module: input.related_module,
            related_entity_id: input.related_entity_id,
            template_variables: input.template_variables,
        }
    }
}

/// Body of `POST /notifications`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    #[validate(length(min = 1, max = 500))]
    pub user_ids: Vec<UserId>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub message_body: String,
    #[validate(url)]
    pub link_url: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub notification_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[validate(length(max = 64))]
    pub related_module: Option<String>,
    #[validate(length(max = 128))]
    pub related_entity_id: Option<String>,
    /// `{{name}}` values applied to title, message and link before storing.
    #[schema(value_type = Option<Object>)]
    pub template_variables: Option<Map<String, Value>>,
    pub delivery_channels: Option<ChannelSet>,
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
}

impl Default for ListNotificationsQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            unread_only: false,
            notification_type: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MarkedRead {
    pub updated: u64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkMarkRead {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_type: BTreeMap<String, u64>,
}
