//! sea-orm backed repositories.

mod delivery_logs;
mod directory;
mod notifications;
mod preferences;
mod providers;
mod scheduled;
mod triggers;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use delivery_logs::PgDeliveryLogRepository;
pub use directory::PgUserDirectory;
pub use notifications::PgNotificationRepository;
pub use preferences::PgPreferenceRepository;
pub use providers::PgProviderRepository;
pub use scheduled::PgScheduledDispatchRepository;
pub use triggers::PgTriggerRepository;

use crate::repository::Repositories;

impl Repositories {
    /// Every store backed by one connection pool.
    pub fn postgres(db: DatabaseConnection) -> Self {
        Self {
            notifications: Arc::new(PgNotificationRepository::new(db.clone())),
            preferences: Arc::new(PgPreferenceRepository::new(db.clone())),
            triggers: Arc::new(PgTriggerRepository::new(db.clone())),
            providers: Arc::new(PgProviderRepository::new(db.clone())),
            delivery_logs: Arc::new(PgDeliveryLogRepository::new(db.clone())),
            scheduled: Arc::new(PgScheduledDispatchRepository::new(db.clone())),
            directory: Arc::new(PgUserDirectory::new(db)),
        }
    }
}
