use crate::models::{Notification, Severity};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub user_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message_body: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub link_url: Option<String>,
    pub notification_type: String,
    pub severity: Severity,
    pub is_read: bool,
    pub read_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub created_by: Option<i64>,
    pub related_module: Option<String>,
    pub related_entity_id: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub template_variables: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            user_id: model.user_id,
            title: model.title,
            message_body: model.message_body,
            link_url: model.link_url,
            notification_type: model.notification_type,
            severity: model.severity,
            is_read: model.is_read,
            read_at: model.read_at.map(Into::into),
            created_at: model.created_at.into(),
            created_by: model.created_by,
            related_module: model.related_module,
            related_entity_id: model.related_entity_id,
            template_variables: model.template_variables,
        }
    }
}

impl From<Notification> for ActiveModel {
    fn from(n: Notification) -> Self {
        ActiveModel {
            id: Set(n.id),
            tenant_id: Set(n.tenant_id),
            user_id: Set(n.user_id),
            title: Set(n.title),
            message_body: Set(n.message_body),
            link_url: Set(n.link_url),
            notification_type: Set(n.notification_type),
            severity: Set(n.severity),
            is_read: Set(n.is_read),
            read_at: Set(n.read_at.map(Into::into)),
            created_at: Set(n.created_at.into()),
            created_by: Set(n.created_by),
            related_module: Set(n.related_module),
            related_entity_id: Set(n.related_entity_id),
            template_variables: Set(n.template_variables),
        }
    }
}
