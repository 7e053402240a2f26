use sea_orm_migration::{prelude::*, schema::*};

use crate::m20261001_000001_create_notifications::Notifications;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailProviderSettings::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmailProviderSettings::Id))
                    .col(big_integer(EmailProviderSettings::TenantId))
                    .col(string_len(EmailProviderSettings::Provider, 16))
                    .col(string_len(EmailProviderSettings::FromEmail, 255))
                    .col(string_len(EmailProviderSettings::FromName, 255))
                    .col(string_len_null(EmailProviderSettings::ReplyToEmail, 255))
                    .col(text(EmailProviderSettings::ApiKey))
                    .col(text_null(EmailProviderSettings::ApiSecret))
                    .col(string_len_null(EmailProviderSettings::SmtpHost, 255))
                    .col(integer_null(EmailProviderSettings::SmtpPort))
                    .col(boolean_null(EmailProviderSettings::SmtpSecure))
                    .col(json_binary_null(EmailProviderSettings::ConfigData))
                    .col(boolean(EmailProviderSettings::IsActive).default(false))
                    .col(
                        timestamp_with_time_zone(EmailProviderSettings::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(EmailProviderSettings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one active provider per tenant, enforced by the database as well.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_email_provider_settings_active \
                 ON email_provider_settings (tenant_id) WHERE is_active",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailDeliveryLogs::Table)
                    .if_not_exists()
                    .col(pk_uuid(EmailDeliveryLogs::Id))
                    .col(big_integer(EmailDeliveryLogs::TenantId))
                    .col(uuid_null(EmailDeliveryLogs::ProviderId))
                    .col(string_len(EmailDeliveryLogs::RecipientEmail, 255))
                    .col(text(EmailDeliveryLogs::Subject))
                    .col(string_len(EmailDeliveryLogs::Status, 16))
                    .col(
                        timestamp_with_time_zone(EmailDeliveryLogs::SentAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(EmailDeliveryLogs::DeliveredAt))
                    .col(timestamp_with_time_zone_null(EmailDeliveryLogs::OpenedAt))
                    .col(timestamp_with_time_zone_null(EmailDeliveryLogs::ClickedAt))
                    .col(text_null(EmailDeliveryLogs::ErrorMessage))
                    .col(uuid_null(EmailDeliveryLogs::NotificationId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_delivery_logs_provider")
                            .from(EmailDeliveryLogs::Table, EmailDeliveryLogs::ProviderId)
                            .to(EmailProviderSettings::Table, EmailProviderSettings::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_delivery_logs_notification")
                            .from(EmailDeliveryLogs::Table, EmailDeliveryLogs::NotificationId)
                            .to(Notifications::Table, Notifications::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_delivery_logs_tenant_status")
                    .table(EmailDeliveryLogs::Table)
                    .col(EmailDeliveryLogs::TenantId)
                    .col(EmailDeliveryLogs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_delivery_logs_tenant_sent")
                    .table(EmailDeliveryLogs::Table)
                    .col(EmailDeliveryLogs::TenantId)
                    .col(EmailDeliveryLogs::SentAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailDeliveryLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmailProviderSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EmailProviderSettings {
    Table,
    Id,
    TenantId,
    Provider,
    FromEmail,
    FromName,
    ReplyToEmail,
    ApiKey,
    ApiSecret,
    SmtpHost,
    SmtpPort,
    SmtpSecure,
    ConfigData,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailDeliveryLogs {
    Table,
    Id,
    TenantId,
    ProviderId,
    RecipientEmail,
    Subject,
    Status,
    SentAt,
    DeliveredAt,
    OpenedAt,
    ClickedAt,
    ErrorMessage,
    NotificationId,
}
