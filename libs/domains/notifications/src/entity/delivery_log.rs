use crate::models::{DeliveryStatus, EmailDeliveryLog};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "email_delivery_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub provider_id: Option<Uuid>,
    pub recipient_email: String,
    #[sea_orm(column_type = "Text")]
    pub subject: String,
    pub status: DeliveryStatus,
    pub sent_at: DateTimeWithTimeZone,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub opened_at: Option<DateTimeWithTimeZone>,
    pub clicked_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub notification_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EmailDeliveryLog {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            provider_id: model.provider_id,
            recipient_email: model.recipient_email,
            subject: model.subject,
            status: model.status,
            sent_at: model.sent_at.into(),
            delivered_at: model.delivered_at.map(Into::into),
            opened_at: model.opened_at.map(Into::into),
            clicked_at: model.clicked_at.map(Into::into),
            error_message: model.error_message,
            notification_id: model.notification_id,
        }
    }
}

impl From<EmailDeliveryLog> for ActiveModel {
    fn from(log: EmailDeliveryLog) -> Self {
        ActiveModel {
            id: Set(log.id),
            tenant_id: Set(log.tenant_id),
            provider_id: Set(log.provider_id),
            recipient_email: Set(log.recipient_email),
            subject: Set(log.subject),
            status: Set(log.status),
            sent_at: Set(log.sent_at.into()),
            delivered_at: Set(log.delivered_at.map(Into::into)),
            opened_at: Set(log.opened_at.map(Into::into)),
            clicked_at: Set(log.clicked_at.map(Into::into)),
            error_message: Set(log.error_message),
            notification_id: Set(log.notification_id),
        }
    }
}
