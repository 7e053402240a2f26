//! In-memory repositories for development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DeliveryLogRepository, NotificationRepository, PreferenceRepository, ProviderRepository,
    ScheduledDispatchRepository, TriggerRepository,
};
use crate::error::NotificationResult;
use crate::models::{
    DispatchRequest, EmailDeliveryLog, EmailLogQuery, EmailProviderSetting,
    ListNotificationsQuery, NewDeliveryLog, NewNotification, Notification,
    NotificationPreference, NotificationStats, NotificationTrigger, ScheduleStatus,
    ScheduledDispatch, TenantId, UpdatePreference, UserId, offset,
};

fn page_of<T: Clone>(rows: &[T], page: u64, limit: u64) -> Vec<T> {
    rows.iter()
        .skip(offset(page, limit) as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationRepository {
    rows: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, for assertions.
    pub async fn all(&self) -> Vec<Notification> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert_batch(&self, rows: Vec<NewNotification>) -> NotificationResult<Vec<Notification>> {
        let mut store = self.rows.write().await;
        let created: Vec<Notification> = rows.into_iter().map(Notification::from_new).collect();
        for n in &created {
            store.insert(n.id, n.clone());
        }
        Ok(created)
    }

    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        query: &ListNotificationsQuery,
    ) -> NotificationResult<(Vec<Notification>, u64)> {
        let store = self.rows.read().await;
        let mut matching: Vec<Notification> = store
            .values()
            .filter(|n| n.tenant_id == tenant_id && n.user_id == user_id)
            .filter(|n| !query.unread_only || !n.is_read)
            .filter(|n| {
                query
                    .notification_type
                    .as_deref()
                    .is_none_or(|t| n.notification_type == t)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        Ok((page_of(&matching, query.page, query.limit), total))
    }

    async fn unread_count(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64> {
        let store = self.rows.read().await;
        Ok(store
            .values()
            .filter(|n| n.tenant_id == tenant_id && n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, tenant_id: TenantId, user_id: UserId, id: Uuid) -> NotificationResult<bool> {
        let mut store = self.rows.write().await;
        match store.get_mut(&id) {
            Some(n) if n.tenant_id == tenant_id && n.user_id == user_id => {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<u64> {
        let mut store = self.rows.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for n in store.values_mut() {
            if n.tenant_id == tenant_id && n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_many_read(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ids: Vec<Uuid>,
    ) -> NotificationResult<u64> {
        let mut store = self.rows.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for id in ids {
            if let Some(n) = store.get_mut(&id)
                && n.tenant_id == tenant_id
                && n.user_id == user_id
                && !n.is_read
            {
                n.is_read = true;
                n.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn stats(&self, tenant_id: TenantId) -> NotificationResult<NotificationStats> {
        let store = self.rows.read().await;
        let mut stats = NotificationStats::default();
        for n in store.values().filter(|n| n.tenant_id == tenant_id) {
            stats.total += 1;
            if !n.is_read {
                stats.unread += 1;
            }
            *stats.by_type.entry(n.notification_type.clone()).or_default() += 1;
        }
        Ok(stats)
    }
}

type PreferenceKey = (TenantId, UserId, String);

#[derive(Debug, Default, Clone)]
pub struct InMemoryPreferenceRepository {
    rows: Arc<RwLock<HashMap<PreferenceKey, NotificationPreference>>>,
}

impl InMemoryPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn find_for_users(
        &self,
        tenant_id: TenantId,
        notification_type: &str,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<NotificationPreference>> {
        let store = self.rows.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|user_id| {
                store
                    .get(&(tenant_id, *user_id, notification_type.to_string()))
                    .cloned()
            })
            .collect())
    }

    async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> NotificationResult<Vec<NotificationPreference>> {
        let store = self.rows.read().await;
        let mut rows: Vec<_> = store
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.notification_type.cmp(&b.notification_type));
        Ok(rows)
    }

    async fn upsert(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> NotificationResult<NotificationPreference> {
        let mut store = self.rows.write().await;
        let key = (tenant_id, user_id, notification_type.to_string());
        let row = match store.get_mut(&key) {
            Some(existing) => {
                existing.apply(input);
                existing.clone()
            }
            None => {
                let row = NotificationPreference::new(tenant_id, user_id, notification_type, input);
                store.insert(key, row.clone());
                row
            }
        };
        Ok(row)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTriggerRepository {
    rows: Arc<RwLock<HashMap<Uuid, NotificationTrigger>>>,
}

impl InMemoryTriggerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TriggerRepository for InMemoryTriggerRepository {
    async fn create(&self, trigger: NotificationTrigger) -> NotificationResult<NotificationTrigger> {
        self.rows.write().await.insert(trigger.id, trigger.clone());
        tracing::info!(trigger_id = %trigger.id, "Created trigger");
        Ok(trigger)
    }

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<NotificationTrigger>> {
        let store = self.rows.read().await;
        Ok(store.get(&id).filter(|t| t.tenant_id == tenant_id).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<NotificationTrigger>> {
        let store = self.rows.read().await;
        let mut rows: Vec<_> = store
            .values()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(&self, trigger: NotificationTrigger) -> NotificationResult<Option<NotificationTrigger>> {
        let mut store = self.rows.write().await;
        match store.get_mut(&trigger.id) {
            Some(existing) if existing.tenant_id == trigger.tenant_id => {
                *existing = trigger.clone();
                Ok(Some(trigger))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let mut store = self.rows.write().await;
        if store.get(&id).is_some_and(|t| t.tenant_id == tenant_id) {
            store.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_active(
        &self,
        tenant_id: TenantId,
        module: &str,
        event: &str,
    ) -> NotificationResult<Vec<NotificationTrigger>> {
        let store = self.rows.read().await;
        let mut rows: Vec<_> = store
            .values()
            .filter(|t| {
                t.tenant_id == tenant_id
                    && t.is_active
                    && t.trigger_module == module
                    && t.trigger_event == event
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryProviderRepository {
    rows: Arc<RwLock<HashMap<Uuid, EmailProviderSetting>>>,
}

impl InMemoryProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn create(&self, mut setting: EmailProviderSetting) -> NotificationResult<EmailProviderSetting> {
        setting.is_active = false;
        self.rows.write().await.insert(setting.id, setting.clone());
        Ok(setting)
    }

    async fn get(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<Option<EmailProviderSetting>> {
        let store = self.rows.read().await;
        Ok(store.get(&id).filter(|s| s.tenant_id == tenant_id).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> NotificationResult<Vec<EmailProviderSetting>> {
        let store = self.rows.read().await;
        let mut rows: Vec<_> = store
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(&self, setting: EmailProviderSetting) -> NotificationResult<Option<EmailProviderSetting>> {
        let mut store = self.rows.write().await;
        match store.get_mut(&setting.id) {
            Some(existing) if existing.tenant_id == setting.tenant_id => {
                let is_active = existing.is_active;
                *existing = EmailProviderSetting {
                    is_active,
                    ..setting
                };
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn activate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        // One write lock covers both steps, so readers never see two active rows.
        let mut store = self.rows.write().await;
        if !store.get(&id).is_some_and(|s| s.tenant_id == tenant_id) {
            return Ok(false);
        }
        let now = Utc::now();
        for setting in store.values_mut().filter(|s| s.tenant_id == tenant_id) {
            let active = setting.id == id;
            if setting.is_active != active {
                setting.is_active = active;
                setting.updated_at = now;
            }
        }
        Ok(true)
    }

    async fn deactivate(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let mut store = self.rows.write().await;
        match store.get_mut(&id) {
            Some(setting) if setting.tenant_id == tenant_id => {
                setting.is_active = false;
                setting.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<bool> {
        let mut store = self.rows.write().await;
        if store.get(&id).is_some_and(|s| s.tenant_id == tenant_id) {
            store.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn active(&self, tenant_id: TenantId) -> NotificationResult<Option<EmailProviderSetting>> {
        let store = self.rows.read().await;
        Ok(store
            .values()
            .find(|s| s.tenant_id == tenant_id && s.is_active)
            .cloned())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDeliveryLogRepository {
    rows: Arc<RwLock<Vec<EmailDeliveryLog>>>,
}

impl InMemoryDeliveryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<EmailDeliveryLog> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl DeliveryLogRepository for InMemoryDeliveryLogRepository {
    async fn record(&self, log: NewDeliveryLog) -> NotificationResult<EmailDeliveryLog> {
        let log = EmailDeliveryLog::from_new(log);
        self.rows.write().await.push(log.clone());
        Ok(log)
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        query: &EmailLogQuery,
    ) -> NotificationResult<(Vec<EmailDeliveryLog>, u64)> {
        let store = self.rows.read().await;
        let mut matching: Vec<_> = store
            .iter()
            .filter(|l| l.tenant_id == tenant_id)
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .filter(|l| query.provider_id.is_none_or(|p| l.provider_id == Some(p)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        Ok((page_of(&matching, query.page, query.limit), total))
    }

    async fn count_by_status(&self, tenant_id: TenantId) -> NotificationResult<BTreeMap<String, u64>> {
        let store = self.rows.read().await;
        let mut counts = BTreeMap::new();
        for log in store.iter().filter(|l| l.tenant_id == tenant_id) {
            *counts.entry(log.status.to_string()).or_default() += 1;
        }
        Ok(counts)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryScheduledDispatchRepository {
    rows: Arc<RwLock<HashMap<Uuid, ScheduledDispatch>>>,
}

impl InMemoryScheduledDispatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ScheduledDispatch> {
        self.rows.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ScheduledDispatchRepository for InMemoryScheduledDispatchRepository {
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        trigger_id: Option<Uuid>,
        request: DispatchRequest,
        due_at: DateTime<Utc>,
    ) -> NotificationResult<ScheduledDispatch> {
        let row = ScheduledDispatch {
            id: Uuid::now_v7(),
            tenant_id,
            trigger_id,
            request: serde_json::to_value(&request)?,
            due_at,
            attempts: 0,
            last_error: None,
            status: ScheduleStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.rows.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: u64,
    ) -> NotificationResult<Vec<ScheduledDispatch>> {
        let mut store = self.rows.write().await;
        let mut due: Vec<&mut ScheduledDispatch> = store
            .values_mut()
            .filter(|r| r.status == ScheduleStatus::Pending && r.due_at <= now)
            .collect();
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at));

        let claimed = due
            .into_iter()
            .take(limit as usize)
            .map(|row| {
                let snapshot = row.clone();
                row.due_at = now + lease;
                row.attempts += 1;
                ScheduledDispatch {
                    attempts: row.attempts,
                    ..snapshot
                }
            })
            .collect();
        Ok(claimed)
    }

    async fn complete(&self, id: Uuid) -> NotificationResult<()> {
        if let Some(row) = self.rows.write().await.get_mut(&id) {
            row.status = ScheduleStatus::Completed;
            row.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: String, retry_at: DateTime<Utc>) -> NotificationResult<()> {
        if let Some(row) = self.rows.write().await.get_mut(&id) {
            row.last_error = Some(error);
            row.due_at = retry_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEmailProvider, Severity};
    use serde_json::json;

    fn new_notification(tenant_id: TenantId, user_id: UserId, kind: &str) -> NewNotification {
        NewNotification {
            tenant_id,
            user_id,
            title: "Title".into(),
            message_body: "Body".into(),
            link_url: None,
            notification_type: kind.into(),
            severity: Severity::Info,
            created_by: None,
            related_module: None,
            related_entity_id: None,
            template_variables: None,
        }
    }

    fn provider(tenant_id: TenantId, kind: &str) -> EmailProviderSetting {
        let input: CreateEmailProvider = serde_json::from_value(json!({
            "provider": kind,
            "fromEmail": "noreply@acme.test",
            "fromName": "Acme",
            "apiKey": "key",
            "configData": { "domain": "mg.acme.test" }
        }))
        .unwrap();
        EmailProviderSetting::new(tenant_id, input)
    }

    #[tokio::test]
    async fn mark_all_read_is_idempotent() {
        let repo = InMemoryNotificationRepository::new();
        repo.insert_batch(vec![
            new_notification(5, 9, "SYSTEM"),
            new_notification(5, 9, "MENTION"),
            new_notification(5, 10, "SYSTEM"),
        ])
        .await
        .unwrap();

        assert_eq!(repo.mark_all_read(5, 9).await.unwrap(), 2);
        assert_eq!(repo.mark_all_read(5, 9).await.unwrap(), 0);
        assert_eq!(repo.unread_count(5, 9).await.unwrap(), 0);
        assert_eq!(repo.unread_count(5, 10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mark_read_rejects_other_users_rows() {
        let repo = InMemoryNotificationRepository::new();
        let rows = repo
            .insert_batch(vec![new_notification(5, 9, "SYSTEM")])
            .await
            .unwrap();

        assert!(!repo.mark_read(5, 10, rows[0].id).await.unwrap());
        assert!(!repo.mark_read(6, 9, rows[0].id).await.unwrap());
        assert!(repo.mark_read(5, 9, rows[0].id).await.unwrap());
    }

    #[tokio::test]
    async fn list_filters_and_pages() {
        let repo = InMemoryNotificationRepository::new();
        let rows: Vec<_> = (0..5).map(|_| new_notification(5, 9, "SYSTEM")).collect();
        repo.insert_batch(rows).await.unwrap();
        repo.insert_batch(vec![new_notification(5, 9, "MENTION")])
            .await
            .unwrap();

        let query = ListNotificationsQuery {
            page: 2,
            limit: 2,
            notification_type: Some("SYSTEM".into()),
            ..Default::default()
        };
        let (items, total) = repo.list_for_user(5, 9, &query).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|n| n.notification_type == "SYSTEM"));
    }

    #[tokio::test]
    async fn activation_leaves_a_single_active_provider() {
        let repo = InMemoryProviderRepository::new();
        let sendgrid = repo.create(provider(5, "SENDGRID")).await.unwrap();
        let mailgun = repo.create(provider(5, "MAILGUN")).await.unwrap();
        let other_tenant = repo.create(provider(6, "SENDGRID")).await.unwrap();

        assert!(repo.activate(5, sendgrid.id).await.unwrap());
        assert!(repo.activate(6, other_tenant.id).await.unwrap());
        assert!(repo.activate(5, mailgun.id).await.unwrap());

        let active: Vec<_> = repo
            .list(5)
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, mailgun.id);
        assert_eq!(repo.active(6).await.unwrap().unwrap().id, other_tenant.id);

        assert!(!repo.activate(6, mailgun.id).await.unwrap());
    }

    #[tokio::test]
    async fn claim_due_leases_rows_and_skips_future_ones() {
        let repo = InMemoryScheduledDispatchRepository::new();
        let now = Utc::now();
        let request = DispatchRequest::new(5, vec![9], "SYSTEM", "t", "m");
        let due = repo
            .enqueue(5, None, request.clone(), now - Duration::seconds(1))
            .await
            .unwrap();
        repo.enqueue(5, None, request, now + Duration::minutes(10))
            .await
            .unwrap();

        let claimed = repo.claim_due(now, Duration::seconds(30), 10).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, due.id);
        assert_eq!(claimed[0].attempts, 1);

        // Leased: not claimable again until the lease runs out.
        assert!(repo.claim_due(now, Duration::seconds(30), 10).await.unwrap().is_empty());
        let later = now + Duration::seconds(31);
        assert_eq!(repo.claim_due(later, Duration::seconds(30), 10).await.unwrap().len(), 1);
    }
}
