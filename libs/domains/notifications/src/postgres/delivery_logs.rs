use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::BTreeMap;

use crate::{
    entity::delivery_log as entity,
    error::NotificationResult,
    models::{DeliveryStatus, EmailDeliveryLog, EmailLogQuery, NewDeliveryLog, TenantId, offset},
    repository::DeliveryLogRepository,
};

pub struct PgDeliveryLogRepository {
    db: DatabaseConnection,
}

impl PgDeliveryLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeliveryLogRepository for PgDeliveryLogRepository {
    async fn record(&self, log: NewDeliveryLog) -> NotificationResult<EmailDeliveryLog> {
        let model = entity::ActiveModel::from(EmailDeliveryLog::from_new(log))
            .insert(&self.db)
            .await?;
        Ok(model.into())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        query: &EmailLogQuery,
    ) -> NotificationResult<(Vec<EmailDeliveryLog>, u64)> {
        let mut select = entity::Entity::find().filter(entity::Column::TenantId.eq(tenant_id));
        if let Some(status) = query.status {
            select = select.filter(entity::Column::Status.eq(status));
        }
        if let Some(provider_id) = query.provider_id {
            select = select.filter(entity::Column::ProviderId.eq(provider_id));
        }

        let total = select.clone().count(&self.db).await?;
        let models = select
            .order_by_desc(entity::Column::SentAt)
            .order_by_desc(entity::Column::Id)
            .limit(query.limit)
            .offset(offset(query.page, query.limit))
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn count_by_status(&self, tenant_id: TenantId) -> NotificationResult<BTreeMap<String, u64>> {
        let rows: Vec<(DeliveryStatus, i64)> = entity::Entity::find()
            .select_only()
            .column(entity::Column::Status)
            .column_as(entity::Column::Id.count(), "count")
            .filter(entity::Column::TenantId.eq(tenant_id))
            .group_by(entity::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| (status.to_string(), count.max(0) as u64))
            .collect())
    }
}
