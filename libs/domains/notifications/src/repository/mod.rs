//! Persistence contracts. Every engine receives these as trait objects; Postgres
//! implementations live in [`crate::postgres`], in-memory ones in [`memory`].

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::directory::{InMemoryUserDirectory, UserDirectory};
use crate::error::NotificationResult;
use crate::models::{
    DispatchRequest, EmailDeliveryLog, EmailLogQuery, EmailProviderSetting,
    ListNotificationsQuery, NewDeliveryLog, NewNotification, Notification,
    NotificationPreference, NotificationStats, NotificationTrigger, ScheduledDispatch, TenantId,
    UpdatePreference, UserId,
};

pub use memory::{
    InMemoryDeliveryLogRepository, InMemoryNotificationRepository, InMemoryPreferenceRepository,
    InMemoryProviderRepository, InMemoryScheduledDispatchRepository, InMemoryTriggerRepository,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Inserts every row or none.
    async fn insert_batch(&self, rows: Vec<NewNotification>) -> NotificationResult<Vec<Notification>>;

    /// Newest first, plus the total matching `query` ignoring paging.
    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        query: &ListNotificationsQuery,
    ) -> NotificationResult<(Vec<Notification>, u64)>;

    async fn unread_count(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64>;

    /// False when the notification does not exist or belongs to someone else.
    async fn mark_read(&self, tenant_id: TenantId, user_id: UserId, id: Uuid) -> NotificationResult<bool>;

    /// Returns the number of rows that changed.
    async fn mark_all_read(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64>;

    /// Only the caller's unread rows among `ids` change.
    async fn mark_many_read(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ids: Vec<Uuid>,
    ) -> NotificationResult<u64>;

    async fn stats(&self, tenant_id: TenantId) -> NotificationResult<NotificationStats>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Stored rows for `notification_type` among `user_ids`.
    async fn find_for_users(
        &self,
        tenant_id: TenantId,
        notification_type: &str,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<NotificationPreference>>;

    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> NotificationResult<Vec<NotificationPreference>>;

    /// Creates or replaces the row for `(tenant, user, type)`.
    async fn upsert(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> NotificationResult<NotificationPreference>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriggerRepository: Send + Sync {
    async fn create(&self, trigger: NotificationTrigger) -> NotificationResult<NotificationTrigger>;

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<NotificationTrigger>>;

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<NotificationTrigger>>;

    /// Replaces the stored trigger; `None` when it does not exist for the tenant.
    async fn update(&self, trigger: NotificationTrigger) -> NotificationResult<Option<NotificationTrigger>>;

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool>;

    /// Active triggers listening for `(module, event)`.
    async fn find_active(
        &self,
        tenant_id: TenantId,
        module: &str,
        event: &str,
    ) -> NotificationResult<Vec<NotificationTrigger>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Stores `setting` as inactive regardless of its flag.
    async fn create(&self, setting: EmailProviderSetting) -> NotificationResult<EmailProviderSetting>;

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<EmailProviderSetting>>;

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<EmailProviderSetting>>;

    /// Replaces everything but `is_active`.
    async fn update(&self, setting: EmailProviderSetting) -> NotificationResult<Option<EmailProviderSetting>>;

    /// Makes `id` the tenant's only active provider in one transaction.
    async fn activate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool>;

    async fn deactivate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool>;

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool>;

    async fn active(&self, tenant_id: TenantId) -> NotificationResult<Option<EmailProviderSetting>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    async fn record(&self, log: NewDeliveryLog) -> NotificationResult<EmailDeliveryLog>;

    async fn list(
        &self,
        tenant_id: TenantId,
        query: &EmailLogQuery,
    ) -> NotificationResult<(Vec<EmailDeliveryLog>, u64)>;

    /// Row count per status name.
    async fn count_by_status(&self, tenant_id: TenantId) -> NotificationResult<BTreeMap<String, u64>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduledDispatchRepository: Send + Sync {
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        trigger_id: Option<Uuid>,
        request: DispatchRequest,
        due_at: DateTime<Utc>,
    ) -> NotificationResult<ScheduledDispatch>;

    /// Leases up to `limit` pending rows due at `now`: their `due_at` moves to
    /// `now + lease` and `attempts` increments, so a crashed worker's rows come
    /// back after the lease.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: u64,
    ) -> NotificationResult<Vec<ScheduledDispatch>>;

    async fn complete(&self, id: Uuid) -> NotificationResult<()>;

    /// Records `error` and reschedules for `retry_at`.
    async fn fail(&self, id: Uuid, error: String, retry_at: DateTime<Utc>) -> NotificationResult<()>;
}

/// Every store the service needs, as shared trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub notifications: Arc<dyn NotificationRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub triggers: Arc<dyn TriggerRepository>,
    pub providers: Arc<dyn ProviderRepository>,
    pub delivery_logs: Arc<dyn DeliveryLogRepository>,
    pub scheduled: Arc<dyn ScheduledDispatchRepository>,
    pub directory: Arc<dyn UserDirectory>,
}

impl Repositories {
    /// Process-local stores for development and tests.
    pub fn in_memory() -> Self {
        Self::in_memory_with_directory(InMemoryUserDirectory::new())
    }

    pub fn in_memory_with_directory(directory: InMemoryUserDirectory) -> Self {
        Self {
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            preferences: Arc::new(InMemoryPreferenceRepository::new()),
            triggers: Arc::new(InMemoryTriggerRepository::new()),
            providers: Arc::new(InMemoryProviderRepository::new()),
            delivery_logs: Arc::new(InMemoryDeliveryLogRepository::new()),
            scheduled: Arc::new(InMemoryScheduledDispatchRepository::new()),
            directory: Arc::new(directory),
        }
    }
}
