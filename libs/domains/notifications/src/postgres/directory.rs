use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};

use crate::{
    directory::UserDirectory,
    entity::tenant_user as entity,
    error::NotificationResult,
    models::{DirectoryUser, TenantId, UserId},
};

/// Reads the host application's `tenant_users` table.
pub struct PgUserDirectory {
    db: DatabaseConnection,
}

impl PgUserDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn active(tenant_id: TenantId) -> Select<entity::Entity> {
        entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::IsActive.eq(true))
            .order_by_asc(entity::Column::Id)
    }

    async fn ids(&self, select: Select<entity::Entity>) -> NotificationResult<Vec<UserId>> {
        Ok(select
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect())
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn all_users(&self, tenant_id: TenantId) -> NotificationResult<Vec<UserId>> {
        self.ids(Self::active(tenant_id)).await
    }

    async fn users_with_roles(
        &self,
        tenant_id: TenantId,
        roles: &[String],
    ) -> NotificationResult<Vec<UserId>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        self.ids(Self::active(tenant_id).filter(entity::Column::Role.is_in(roles.iter().cloned())))
            .await
    }

    async fn users_in_departments(
        &self,
        tenant_id: TenantId,
        departments: &[String],
    ) -> NotificationResult<Vec<UserId>> {
        if departments.is_empty() {
            return Ok(Vec::new());
        }
        self.ids(
            Self::active(tenant_id)
                .filter(entity::Column::Department.is_in(departments.iter().cloned())),
        )
        .await
    }

    async fn find_by_display_names(
        &self,
        tenant_id: TenantId,
        names: &[String],
    ) -> NotificationResult<Vec<DirectoryUser>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let models = Self::active(tenant_id)
            .filter(Expr::expr(Func::lower(Expr::col(entity::Column::DisplayName))).is_in(lowered))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn contacts(
        &self,
        tenant_id: TenantId,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<DirectoryUser>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = Self::active(tenant_id)
            .filter(entity::Column::Id.is_in(user_ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
