use sea_orm_migration::{prelude::*, schema::*};

use crate::m20261001_000002_create_notification_triggers::NotificationTriggers;

/// Durable queue for triggers with a delivery delay.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduledDispatches::Table)
                    .if_not_exists()
                    .col(pk_uuid(ScheduledDispatches::Id))
                    .col(big_integer(ScheduledDispatches::TenantId))
                    .col(uuid_null(ScheduledDispatches::TriggerId))
                    .col(json_binary(ScheduledDispatches::Request))
                    .col(timestamp_with_time_zone(ScheduledDispatches::DueAt))
                    .col(integer(ScheduledDispatches::Attempts).default(0))
                    .col(text_null(ScheduledDispatches::LastError))
                    .col(string_len(ScheduledDispatches::Status, 16).default("pending"))
                    .col(
                        timestamp_with_time_zone(ScheduledDispatches::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(ScheduledDispatches::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scheduled_dispatches_trigger")
                            .from(ScheduledDispatches::Table, ScheduledDispatches::TriggerId)
                            .to(NotificationTriggers::Table, NotificationTriggers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_dispatches_due")
                    .table(ScheduledDispatches::Table)
                    .col(ScheduledDispatches::Status)
                    .col(ScheduledDispatches::DueAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduledDispatches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledDispatches {
    Table,
    Id,
    TenantId,
    TriggerId,
    Request,
    DueAt,
    Attempts,
    LastError,
    Status,
    CreatedAt,
    CompletedAt,
}
