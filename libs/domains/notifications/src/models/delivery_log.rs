use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{NotificationStats, TenantId, default_limit, default_page};

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "opened")]
    Opened,
    #[sea_orm(string_value = "clicked")]
    Clicked,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "bounced")]
    Bounced,
}

/// One outbound email attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryLog {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub provider_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub status: DeliveryStatus,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub notification_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryLog {
    pub tenant_id: TenantId,
    pub provider_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub notification_id: Option<Uuid>,
}

impl EmailDeliveryLog {
    pub fn from_new(input: NewDeliveryLog) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: input.tenant_id,
            provider_id: input.provider_id,
            recipient_email: input.recipient_email,
            subject: input.subject,
            status: input.status,
            sent_at: Utc::now(),
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            error_message: input.error_message,
            notification_id: input.notification_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmailLogQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u64,
    pub status: Option<DeliveryStatus>,
    pub provider_id: Option<Uuid>,
}

impl Default for EmailLogQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            provider_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
}

impl DeliveryStats {
    pub fn from_counts(by_status: BTreeMap<String, u64>) -> Self {
        Self {
            total: by_status.values().sum(),
            by_status,
        }
    }
}

/// `GET /analytics` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub notifications: NotificationStats,
    pub email_delivery: DeliveryStats,
    pub generated_at: DateTime<Utc>,
}
