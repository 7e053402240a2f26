use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_uuid(Notifications::Id))
                    .col(big_integer(Notifications::TenantId))
                    .col(big_integer(Notifications::UserId))
                    .col(string_len(Notifications::Title, 255))
                    .col(text(Notifications::MessageBody))
                    .col(text_null(Notifications::LinkUrl))
                    .col(string_len(Notifications::NotificationType, 64))
                    .col(string_len(Notifications::Severity, 16).default("INFO"))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(timestamp_with_time_zone_null(Notifications::ReadAt))
                    .col(
                        timestamp_with_time_zone(Notifications::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(big_integer_null(Notifications::CreatedBy))
                    .col(string_len_null(Notifications::RelatedModule, 64))
                    .col(string_len_null(Notifications::RelatedEntityId, 128))
                    .col(json_binary_null(Notifications::TemplateVariables))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_inbox")
                    .table(Notifications::Table)
                    .col(Notifications::TenantId)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_tenant_created")
                    .table(Notifications::Table)
                    .col(Notifications::TenantId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationPreferences::Table)
                    .if_not_exists()
                    .col(pk_uuid(NotificationPreferences::Id))
                    .col(big_integer(NotificationPreferences::TenantId))
                    .col(big_integer(NotificationPreferences::UserId))
                    .col(string_len(NotificationPreferences::NotificationType, 64))
                    .col(boolean(NotificationPreferences::InAppEnabled).default(true))
                    .col(boolean(NotificationPreferences::EmailEnabled).default(false))
                    .col(
                        string_len(NotificationPreferences::DigestFrequency, 16)
                            .default("immediate"),
                    )
                    .col(boolean(NotificationPreferences::QuietHours).default(false))
                    .col(string_len_null(NotificationPreferences::QuietStart, 5))
                    .col(string_len_null(NotificationPreferences::QuietEnd, 5))
                    .col(
                        timestamp_with_time_zone(NotificationPreferences::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(NotificationPreferences::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_notification_preferences_user_type")
                    .table(NotificationPreferences::Table)
                    .col(NotificationPreferences::TenantId)
                    .col(NotificationPreferences::UserId)
                    .col(NotificationPreferences::NotificationType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationPreferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Notifications {
    Table,
    Id,
    TenantId,
    UserId,
    Title,
    MessageBody,
    LinkUrl,
    NotificationType,
    Severity,
    IsRead,
    ReadAt,
    CreatedAt,
    CreatedBy,
    RelatedModule,
    RelatedEntityId,
    TemplateVariables,
}

#[derive(DeriveIden)]
enum NotificationPreferences {
    Table,
    Id,
    TenantId,
    UserId,
    NotificationType,
    InAppEnabled,
    EmailEnabled,
    DigestFrequency,
    QuietHours,
    QuietStart,
    QuietEnd,
    CreatedAt,
    UpdatedAt,
}
