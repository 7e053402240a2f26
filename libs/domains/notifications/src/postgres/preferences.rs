use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    entity::preference as entity,
    error::NotificationResult,
    models::{NotificationPreference, TenantId, UpdatePreference, UserId},
    repository::PreferenceRepository,
};

pub struct PgPreferenceRepository {
    db: DatabaseConnection,
}

impl PgPreferenceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn find_for_users(
        &self,
        tenant_id: TenantId,
        notification_type: &str,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<NotificationPreference>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::NotificationType.eq(notification_type))
            .filter(entity::Column::UserId.is_in(user_ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> NotificationResult<Vec<NotificationPreference>> {
        let models = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .order_by_asc(entity::Column::NotificationType)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn upsert(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> NotificationResult<NotificationPreference> {
        let existing = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::NotificationType.eq(notification_type))
            .one(&self.db)
            .await?;

        let model = match existing {
            Some(model) => {
                let mut preference: NotificationPreference = model.into();
                preference.apply(input);
                entity::ActiveModel::from(preference).update(&self.db).await?
            }
            None => {
                let preference =
                    NotificationPreference::new(tenant_id, user_id, notification_type, input);
                entity::ActiveModel::from(preference).insert(&self.db).await?
            }
        };

        tracing::info!(tenant_id, user_id, notification_type, "Saved notification preference");
        Ok(model.into())
    }
}
