pub use sea_orm_migration::prelude::*;

mod m20261001_000000_create_tenant_users;
mod m20261001_000001_create_notifications;
mod m20261001_000002_create_notification_triggers;
mod m20261001_000003_create_email_delivery;
mod m20261001_000004_create_scheduled_dispatches;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000000_create_tenant_users::Migration),
            Box::new(m20261001_000001_create_notifications::Migration),
            Box::new(m20261001_000002_create_notification_triggers::Migration),
            Box::new(m20261001_000003_create_email_delivery::Migration),
            Box::new(m20261001_000004_create_scheduled_dispatches::Migration),
        ]
    }
}
