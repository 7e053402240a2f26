use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    entity::trigger as entity,
    error::NotificationResult,
    models::{NotificationTrigger, TenantId},
    repository::TriggerRepository,
};

pub struct PgTriggerRepository {
    db: DatabaseConnection,
}

impl PgTriggerRepository {
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
impl TriggerRepository for PgTriggerRepository {
    async fn create(&self, trigger: NotificationTrigger) -> NotificationResult<NotificationTrigger> {
        let model = entity::ActiveModel::from(trigger).insert(&self.db).await?;
        tracing::info!(trigger_id = %model.id, "Created trigger");
        Ok(model.into())
    }

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<NotificationTrigger>> {
        Ok(self.find_owned(tenant_id, id).await?.map(Into::into))
    }

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<NotificationTrigger>> {
        let models = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .order_by_desc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, trigger: NotificationTrigger) -> NotificationResult<Option<NotificationTrigger>> {
        if self.find_owned(trigger.tenant_id, trigger.id).await?.is_none() {
            return Ok(None);
        }
        let model = entity::ActiveModel::from(trigger).update(&self.db).await?;
        tracing::info!(trigger_id = %model.id, "Updated trigger");
        Ok(Some(model.into()))
    }

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Id.eq(id))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(trigger_id = %id, "Deleted trigger");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
        module: &str,
        event: &str,
    ) -> NotificationResult<Vec<NotificationTrigger>> {
        let models = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::TriggerModule.eq(module))
            .filter(entity::Column::TriggerEvent.eq(event))
            .filter(entity::Column::IsActive.eq(true))
            .order_by_asc(entity::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
