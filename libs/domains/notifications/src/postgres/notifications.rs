use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity::notification as entity,
    error::NotificationResult,
    models::{
        ListNotificationsQuery, NewNotification, Notification, NotificationStats, TenantId, UserId,
        offset,
    },
    repository::NotificationRepository,
};

pub struct PgNotificationRepository {
    db: DatabaseConnection,
}

impl PgNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert_batch(&self, rows: Vec<NewNotification>) -> NotificationResult<Vec<Notification>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // One multi-row INSERT ... RETURNING, so the batch lands atomically.
        let models: Vec<entity::ActiveModel> = rows
            .into_iter()
            .map(|row| Notification::from_new(row).into())
            .collect();
        let created: Vec<Notification> = entity::Entity::insert_many(models)
            .exec_with_returning(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        tracing::debug!(count = created.len(), "Inserted notifications");
        Ok(created)
    }

    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        query: &ListNotificationsQuery,
    ) -> NotificationResult<(Vec<Notification>, u64)> {
        let mut select = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id));

        if query.unread_only {
            select = select.filter(entity::Column::IsRead.eq(false));
        }
        if let Some(kind) = &query.notification_type {
            select = select.filter(entity::Column::NotificationType.eq(kind.as_str()));
        }

        let total = select.clone().count(&self.db).await?;
        let models = select
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_desc(entity::Column::Id)
            .limit(query.limit)
            .offset(offset(query.page, query.limit))
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn unread_count(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64> {
        let count = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, tenant_id: TenantId, user_id: UserId, id: Uuid) -> NotificationResult<bool> {
        let owned = entity::Entity::find_by_id(id)
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(model) = owned else {
            return Ok(false);
        };
        if !model.is_read {
            entity::Entity::update_many()
                .col_expr(entity::Column::IsRead, Expr::value(true))
                .col_expr(entity::Column::ReadAt, Expr::value(Utc::now()))
                .filter(entity::Column::Id.eq(id))
                .filter(entity::Column::IsRead.eq(false))
                .exec(&self.db)
                .await?;
        }
        Ok(true)
    }

    async fn mark_all_read(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64> {
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::IsRead, Expr::value(true))
            .col_expr(entity::Column::ReadAt, Expr::value(Utc::now()))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn mark_many_read(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ids: Vec<Uuid>,
    ) -> NotificationResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::IsRead, Expr::value(true))
            .col_expr(entity::Column::ReadAt, Expr::value(Utc::now()))
            .filter(entity::Column::Id.is_in(ids))
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn stats(&self, tenant_id: TenantId) -> NotificationResult<NotificationStats> {
        let by_type: Vec<(String, i64)> = entity::Entity::find()
            .select_only()
            .column(entity::Column::NotificationType)
            .column_as(entity::Column::Id.count(), "count")
            .filter(entity::Column::TenantId.eq(tenant_id))
            .group_by(entity::Column::NotificationType)
            .into_tuple()
            .all(&self.db)
            .await?;

        let unread = entity::Entity::find()
            .filter(entity::Column::TenantId.eq(tenant_id))
            .filter(entity::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;

        let by_type: std::collections::BTreeMap<String, u64> = by_type
            .into_iter()
            .map(|(kind, count)| (kind, count.max(0) as u64))
            .collect();

        Ok(NotificationStats {
            total: by_type.values().sum(),
            unread,
            by_type,
        })
    }
}
