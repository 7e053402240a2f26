use sea_orm_migration::{prelude::*, schema::*};

/// Read-only mirror of the host application's user directory. The host keeps it in
/// sync; the notifier only reads it to resolve recipients and mentions.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TenantUsers::Table)
                    .if_not_exists()
                    .col(big_integer(TenantUsers::Id).primary_key())
                    .col(big_integer(TenantUsers::TenantId))
                    .col(string_len_null(TenantUsers::Email, 255))
                    .col(string_len(TenantUsers::DisplayName, 255))
                    .col(string_len(TenantUsers::Role, 64))
                    .col(string_len_null(TenantUsers::Department, 128))
                    .col(boolean(TenantUsers::IsActive).default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tenant_users_tenant_role")
                    .table(TenantUsers::Table)
                    .col(TenantUsers::TenantId)
                    .col(TenantUsers::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_tenant_users_display_name \
                 ON tenant_users (tenant_id, lower(display_name))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TenantUsers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TenantUsers {
    Table,
    Id,
    TenantId,
    Email,
    DisplayName,
    Role,
    Department,
    IsActive,
}
