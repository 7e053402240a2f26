use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::provider_setting as entity,
    error::NotificationResult,
    models::{EmailProviderSetting, TenantId},
    repository::ProviderRepository,
};

pub struct PgProviderRepository {
    db: DatabaseConnection,
}

impl PgProviderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_owned(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<entity::Model>> {
        Ok(entity::Entity::find_by_id(id)
            .filter(entity::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl ProviderRepository for PgProviderRepository {
    async fn create(&self, mut setting: EmailProviderSetting) -> NotificationResult<EmailProviderSetting> {
        setting.is_active = false;
        let model = entity::ActiveModel::from(setting).insert(&self.db).await?;
        tracing::info!(provider_id = %model.id, provider = %model.provider, "Created email provider");
        Ok(model.into())
    }

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<EmailProviderSetting>> {
        Ok(self.find_owned(tenant_id, id).await?.map(Into::into))
    }

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<EmailProviderSetting>> {
        let models = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .order_by_desc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, setting: EmailProviderSetting) -> NotificationResult<Option<EmailProviderSetting>> {
        let Some(existing) = self.find_owned(setting.tenant_id, setting.id).await? else {
            return Ok(None);
        };

        let mut active = entity::ActiveModel::from(setting);
        active.is_active = Set(existing.is_active);
        let model = active.update(&self.db).await?;
        Ok(Some(model.into()))
    }

    async fn activate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let txn = self.db.begin().await?;

        let exists = entity::Entity::find_by_id(id)
            .filter(entity::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            txn.rollback().await?;
            return Ok(false);
        }

        let now = Utc::now();
        entity::Entity::update_many()
            .col_expr(entity::Column::IsActive, Expr::value(false))
            .col_expr(entity::Column::UpdatedAt, Expr::value(now))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::IsActive.eq(true))
            .filter(entity::Column::Id.ne(id))
            .exec(&txn)
            .await?;
        entity::Entity::update_many()
            .col_expr(entity::Column::IsActive, Expr::value(true))
            .col_expr(entity::Column::UpdatedAt, Expr::value(now))
            .filter(entity::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(tenant_id, provider_id = %id, "Activated email provider");
        Ok(true)
    }

    async fn deactivate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::IsActive, Expr::value(false))
            .col_expr(entity::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            tracing::info!(provider_id = %id, "Deleted email provider");
        }
        Ok(result.rows_affected > 0)
    }

    async fn active(&self, tenant_id: TenantId) -> NotificationResult<Option<EmailProviderSetting>> {
        let model = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }
}
