use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationTriggers::Table)
                    .if_not_exists()
                    .col(pk_uuid(NotificationTriggers::Id))
                    .col(big_integer(NotificationTriggers::TenantId))
                    .col(string_len(NotificationTriggers::TriggerName, 128))
                    .col(string_len(NotificationTriggers::TriggerModule, 64))
                    .col(string_len(NotificationTriggers::TriggerEvent, 64))
                    .col(string_len(NotificationTriggers::NotificationType, 64))
                    .col(string_len(NotificationTriggers::Severity, 16).default("INFO"))
                    .col(text(NotificationTriggers::TitleTemplate))
                    .col(text(NotificationTriggers::MessageTemplate))
                    .col(text_null(NotificationTriggers::LinkTemplate))
                    .col(string_len(NotificationTriggers::RecipientType, 32))
                    .col(json_binary(NotificationTriggers::RecipientConfig))
                    .col(json_binary(NotificationTriggers::DeliveryChannels))
                    .col(integer(NotificationTriggers::DeliveryDelay).default(0))
                    .col(boolean(NotificationTriggers::BatchDelivery).default(false))
                    .col(json_binary_null(NotificationTriggers::TriggerConditions))
                    .col(boolean(NotificationTriggers::IsActive).default(true))
                    .col(big_integer(NotificationTriggers::CreatedBy))
                    .col(
                        timestamp_with_time_zone(NotificationTriggers::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(NotificationTriggers::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notification_triggers_event")
                    .table(NotificationTriggers::Table)
                    .col(NotificationTriggers::TenantId)
                    .col(NotificationTriggers::TriggerModule)
                    .col(NotificationTriggers::TriggerEvent)
                    .col(NotificationTriggers::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationTriggers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum NotificationTriggers {
    Table,
    Id,
    TenantId,
    TriggerName,
    TriggerModule,
    TriggerEvent,
    NotificationType,
    Severity,
    TitleTemplate,
    MessageTemplate,
    LinkTemplate,
    RecipientType,
    RecipientConfig,
    DeliveryChannels,
    DeliveryDelay,
    BatchDelivery,
    TriggerConditions,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
