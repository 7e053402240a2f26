use crate::models::DirectoryUser;
use sea_orm::entity::prelude::*;

/// Read-only view of the host application's users.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tenant_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub tenant_id: i64,
    pub email: Option<String>,
    pub display_name: String,
    pub role: String,
    pub department: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DirectoryUser {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            email: model.email,
            display_name: model.display_name,
            role: model.role,
            department: model.department,
            is_active: model.is_active,
        }
    }
}
