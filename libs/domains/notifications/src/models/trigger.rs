use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{ChannelSet, Severity, TenantId, UserId};

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
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecipientType {
    #[sea_orm(string_value = "all_users")]
    AllUsers,
    #[sea_orm(string_value = "specific_users")]
    SpecificUsers,
    #[sea_orm(string_value = "role_based")]
    RoleBased,
    #[sea_orm(string_value = "department_based")]
    DepartmentBased,
    #[sea_orm(string_value = "conditional")]
    Conditional,
}

fn empty_object() -> Value {
    json!({})
}

fn default_true() -> bool {
    true
}

/// Keeps an explicit `null` distinguishable from an absent field.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Maps `(module, event)` producer events to templated notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTrigger {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub trigger_name: String,
    pub trigger_module: String,
    pub trigger_event: String,
    pub notification_type: String,
    pub severity: Severity,
    pub title_template: String,
    pub message_template: String,
    pub link_template: Option<String>,
    pub recipient_type: RecipientType,
    #[schema(value_type = Object)]
    pub recipient_config: Value,
    pub delivery_channels: ChannelSet,
    /// Minutes.
    pub delivery_delay: i32,
    pub batch_delivery: bool,
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Value>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTrigger {
    pub fn new(tenant_id: TenantId, created_by: UserId, input: CreateTrigger) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            trigger_name: input.trigger_name,
            trigger_module: input.trigger_module,
            trigger_event: input.trigger_event,
            notification_type: input.notification_type,
            severity: input.severity,
            title_template: input.title_template,
            message_template: input.message_template,
            link_template: input.link_template,
            recipient_type: input.recipient_type,
            recipient_config: input.recipient_config,
            delivery_channels: input.delivery_channels,
            delivery_delay: input.delivery_delay,
            batch_delivery: input.batch_delivery,
            trigger_conditions: input.trigger_conditions,
            is_active: input.is_active,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the present fields of `input`.
    pub fn apply(&mut self, input: UpdateTrigger) {
        if let Some(v) = input.trigger_name {
            self.trigger_name = v;
        }
        if let Some(v) = input.trigger_module {
            self.trigger_module = v;
        }
        if let Some(v) = input.trigger_event {
            self.trigger_event = v;
        }
        if let Some(v) = input.notification_type {
            self.notification_type = v;
        }
        if let Some(v) = input.severity {
            self.severity = v;
        }
        if let Some(v) = input.title_template {
            self.title_template = v;
        }
        if let Some(v) = input.message_template {
            self.message_template = v;
        }
        if let Some(v) = input.link_template {
            self.link_template = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = input.recipient_type {
            self.recipient_type = v;
        }
        if let Some(v) = input.recipient_config {
            self.recipient_config = v;
        }
        if let Some(v) = input.delivery_channels {
            self.delivery_channels = v;
        }
        if let Some(v) = input.delivery_delay {
            self.delivery_delay = v;
        }
        if let Some(v) = input.batch_delivery {
            self.batch_delivery = v;
        }
        if let Some(v) = input.trigger_conditions {
            self.trigger_conditions = Some(v).filter(|c| !c.is_null());
        }
        if let Some(v) = input.is_active {
            self.is_active = v;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrigger {
    #[validate(length(min = 1, max = 128))]
    pub trigger_name: String,
    #[validate(length(min = 1, max = 64))]
    pub trigger_module: String,
    #[validate(length(min = 1, max = 64))]
    pub trigger_event: String,
    #[validate(length(min = 1, max = 64))]
    pub notification_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[validate(length(min = 1, max = 255))]
    pub title_template: String,
    #[validate(length(min = 1, max = 5000))]
    pub message_template: String,
    #[validate(length(max = 2048))]
    pub link_template: Option<String>,
    pub recipient_type: RecipientType,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub recipient_config: Value,
    #[serde(default = "ChannelSet::in_app_only")]
    pub delivery_channels: ChannelSet,
    #[serde(default)]
    #[validate(range(min = 0, max = 10080))]
    pub delivery_delay: i32,
    #[serde(default)]
    pub batch_delivery: bool,
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrigger {
    #[validate(length(min = 1, max = 128))]
    pub trigger_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub trigger_module: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub trigger_event: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub notification_type: Option<String>,
    pub severity: Option<Severity>,
    #[validate(length(min = 1, max = 255))]
    pub title_template: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub message_template: Option<String>,
    /// Empty string clears the link.
    #[validate(length(max = 2048))]
    pub link_template: Option<String>,
    pub recipient_type: Option<RecipientType>,
    #[schema(value_type = Option<Object>)]
    pub recipient_config: Option<Value>,
    pub delivery_channels: Option<ChannelSet>,
    #[validate(range(min = 0, max = 10080))]
    pub delivery_delay: Option<i32>,
    pub batch_delivery: Option<bool>,
    /// `null` clears the conditions.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Value>,
    pub is_active: Option<bool>,
}

/// A domain event from a producer module.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    #[validate(length(min = 1, max = 64))]
    pub module: String,
    #[validate(length(min = 1, max = 64))]
    pub event: String,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub payload: Value,
}

/// Summary of what one event caused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventOutcome {
    pub matched: usize,
    pub dispatched: usize,
    pub scheduled: usize,
    pub skipped: usize,
    pub failed: usize,
    pub notifications: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;

    fn create(value: Value) -> CreateTrigger {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_trigger_defaults() {
        let input = create(json!({
            "triggerName": "Overdue tasks",
            "triggerModule": "tasks",
            "triggerEvent": "overdue",
            "notificationType": "TASK_OVERDUE",
            "titleTemplate": "{{taskName}} is overdue",
            "messageTemplate": "Please check {{taskName}}",
            "recipientType": "all_users"
        }));
        assert!(input.validate().is_ok());
        assert_eq!(input.recipient_config, json!({}));
        assert_eq!(input.delivery_channels, ChannelSet(vec![Channel::InApp]));
        assert_eq!(input.delivery_delay, 0);
        assert!(input.is_active);
    }

    #[test]
    fn rejects_negative_delay() {
        let input = create(json!({
            "triggerName": "n",
            "triggerModule": "m",
            "triggerEvent": "e",
            "notificationType": "SYSTEM",
            "titleTemplate": "t",
            "messageTemplate": "m",
            "recipientType": "all_users",
            "deliveryDelay": -5
        }));
        assert!(input.validate().unwrap_err().field_errors().contains_key("delivery_delay"));
    }

    #[test]
    fn apply_update_clears_link_and_conditions() {
        let mut trigger = NotificationTrigger::new(
            1,
            2,
            create(json!({
                "triggerName": "n",
                "triggerModule": "m",
                "triggerEvent": "e",
                "notificationType": "SYSTEM",
                "titleTemplate": "t",
                "messageTemplate": "m",
                "linkTemplate": "/x",
                "recipientType": "all_users",
                "triggerConditions": {"field": "a", "operator": "exists"}
            })),
        );
        let update: UpdateTrigger = serde_json::from_value(json!({
            "linkTemplate": "",
            "isActive": false
        }))
        .unwrap();
        trigger.apply(update);
        assert_eq!(trigger.link_template, None);
        assert!(!trigger.is_active);
        assert!(trigger.trigger_conditions.is_some());

        let clear: UpdateTrigger =
            serde_json::from_value(json!({ "triggerConditions": null })).unwrap();
        trigger.apply(clear);
        assert_eq!(trigger.trigger_conditions, None);
    }
}
