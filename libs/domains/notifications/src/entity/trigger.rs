use crate::models::{ChannelSet, NotificationTrigger, RecipientType, Severity};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_triggers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub trigger_name: String,
    pub trigger_module: String,
    pub trigger_event: String,
    pub notification_type: String,
    pub severity: Severity,
    #[sea_orm(column_type = "Text")]
    pub title_template: String,
    #[sea_orm(column_type = "Text")]
    pub message_template: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub link_template: Option<String>,
    pub recipient_type: RecipientType,
    #[sea_orm(column_type = "JsonBinary")]
    pub recipient_config: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub delivery_channels: ChannelSet,
    pub delivery_delay: i32,
    pub batch_delivery: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub trigger_conditions: Option<Json>,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for NotificationTrigger {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            trigger_name: model.trigger_name,
            trigger_module: model.trigger_module,
            trigger_event: model.trigger_event,
            notification_type: model.notification_type,
            severity: model.severity,
            title_template: model.title_template,
            message_template: model.message_template,
            link_template: model.link_template,
            recipient_type: model.recipient_type,
            recipient_config: model.recipient_config,
            delivery_channels: model.delivery_channels,
            delivery_delay: model.delivery_delay,
            batch_delivery: model.batch_delivery,
            trigger_conditions: model.trigger_conditions,
            is_active: model.is_active,
            created_by: model.created_by,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NotificationTrigger> for ActiveModel {
    fn from(t: NotificationTrigger) -> Self {
        ActiveModel {
            id: Set(t.id),
            tenant_id: Set(t.tenant_id),
            trigger_name: Set(t.trigger_name),
            trigger_module: Set(t.trigger_module),
            trigger_event: Set(t.trigger_event),
            notification_type: Set(t.notification_type),
            severity: Set(t.severity),
            title_template: Set(t.title_template),
            message_template: Set(t.message_template),
            link_template: Set(t.link_template),
            recipient_type: Set(t.recipient_type),
            recipient_config: Set(t.recipient_config),
            delivery_channels: Set(t.delivery_channels),
            delivery_delay: Set(t.delivery_delay),
            batch_delivery: Set(t.batch_delivery),
            trigger_conditions: Set(t.trigger_conditions),
            is_active: Set(t.is_active),
            created_by: Set(t.created_by),
            created_at: Set(t.created_at.into()),
            updated_at: Set(t.updated_at.into()),
        }
    }
}
