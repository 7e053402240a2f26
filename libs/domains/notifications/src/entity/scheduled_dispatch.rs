use crate::models::{ScheduleStatus, ScheduledDispatch};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_dispatches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: i64,
    pub trigger_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub request: Json,
    pub due_at: DateTimeWithTimeZone,
    pub attempts: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    pub status: ScheduleStatus,
    pub created_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ScheduledDispatch {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            trigger_id: model.trigger_id,
            request: model.request,
            due_at: model.due_at.into(),
            attempts: model.attempts,
            last_error: model.last_error,
            status: model.status,
            created_at: model.created_at.into(),
            completed_at: model.completed_at.map(Into::into),
        }
    }
}
