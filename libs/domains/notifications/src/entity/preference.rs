use crate::models::{DigestFrequency, NotificationPreference};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub user_id: i64,
    pub notification_type: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub digest_frequency: DigestFrequency,
    pub quiet_hours: bool,
    pub quiet_start: Option<String>,
    pub quiet_end: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for NotificationPreference {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            user_id: model.user_id,
            notification_type: model.notification_type,
            in_app_enabled: model.in_app_enabled,
            email_enabled: model.email_enabled,
            digest_frequency: model.digest_frequency,
            quiet_hours: model.quiet_hours,
            quiet_start: model.quiet_start,
            quiet_end: model.quiet_end,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NotificationPreference> for ActiveModel {
    fn from(p: NotificationPreference) -> Self {
        ActiveModel {
            id: Set(p.id),
            tenant_id: Set(p.tenant_id),
            user_id: Set(p.user_id),
            notification_type: Set(p.notification_type),
            in_app_enabled: Set(p.in_app_enabled),
            email_enabled: Set(p.email_enabled),
            digest_frequency: Set(p.digest_frequency),
            quiet_hours: Set(p.quiet_hours),
            quiet_start: Set(p.quiet_start),
            quiet_end: Set(p.quiet_end),
            created_at: Set(p.created_at.into()),
            updated_at: Set(p.updated_at.into()),
        }
    }
}
