use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, Statement,
};
use uuid::Uuid;

use crate::{
    entity::scheduled_dispatch as entity,
    error::NotificationResult,
    models::{DispatchRequest, ScheduleStatus, ScheduledDispatch, TenantId},
    repository::ScheduledDispatchRepository,
};

/// Pushes the lease forward on every row it returns. `SKIP LOCKED` keeps
/// concurrent workers from claiming the same row.
const CLAIM_DUE_SQL: &str = r#"
UPDATE scheduled_dispatches
   SET due_at = $1, attempts = attempts + 1
 WHERE id IN (
       SELECT id FROM scheduled_dispatches
        WHERE status = 'pending' AND due_at <= $2
        ORDER BY due_at
        LIMIT $3
        FOR UPDATE SKIP LOCKED)
RETURNING *"#;

pub struct PgScheduledDispatchRepository {
    db: DatabaseConnection,
}

impl PgScheduledDispatchRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduledDispatchRepository for PgScheduledDispatchRepository {
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        trigger_id: Option<Uuid>,
        request: DispatchRequest,
        due_at: DateTime<Utc>,
    ) -> NotificationResult<ScheduledDispatch> {
        let active = entity::ActiveModel {
            id: Set(Uuid::now_v7()),
            tenant_id: Set(tenant_id),
            trigger_id: Set(trigger_id),
            request: Set(serde_json::to_value(&request)?),
            due_at: Set(due_at.into()),
            attempts: Set(0),
            last_error: Set(None),
            status: Set(ScheduleStatus::Pending),
            created_at: Set(Utc::now().into()),
            completed_at: Set(None),
        };
        let model = active.insert(&self.db).await?;
        tracing::info!(dispatch_id = %model.id, due_at = %due_at, "Scheduled delayed dispatch");
        Ok(model.into())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: u64,
    ) -> NotificationResult<Vec<ScheduledDispatch>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            CLAIM_DUE_SQL,
            [
                (now + lease).into(),
                now.into(),
                (limit.min(i64::MAX as u64) as i64).into(),
            ],
        );
        let models = entity::Entity::find()
            .from_raw_sql(statement)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn complete(&self, id: Uuid) -> NotificationResult<()> {
        entity::Entity::update_many()
            .col_expr(
                entity::Column::Status,
                Expr::value(ScheduleStatus::Completed.to_value()),
            )
            .col_expr(entity::Column::CompletedAt, Expr::value(Utc::now()))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: String, retry_at: DateTime<Utc>) -> NotificationResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::LastError, Expr::value(error))
            .col_expr(entity::Column::DueAt, Expr::value(retry_at))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
