use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::NotificationResult;
use crate::models::{AnalyticsReport, DeliveryStats, TenantId};
use crate::repository::{DeliveryLogRepository, NotificationRepository};

/// Per-tenant notification and delivery aggregates, cached for `ttl`.
#[derive(Clone)]
pub struct Analytics {
    notifications: Arc<dyn NotificationRepository>,
    logs: Arc<dyn DeliveryLogRepository>,
    ttl: Duration,
    cache: Arc<RwLock<HashMap<TenantId, (Instant, AnalyticsReport)>>>,
}

impl Analytics {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        logs: Arc<dyn DeliveryLogRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            notifications,
            logs,
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[instrument(skip(self))]
    pub async fn report(&self, tenant_id: TenantId) -> NotificationResult<AnalyticsReport> {
        let cached = self
            .cache
            .read()
            .await
            .get(&tenant_id)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, report)| report.clone());
        if let Some(report) = cached {
            debug!("Analytics cache hit");
            return Ok(report);
        }

        let notifications = self.notifications.stats(tenant_id).await?;
        let by_status = self.logs.count_by_status(tenant_id).await?;
        let report = AnalyticsReport {
            notifications,
            email_delivery: DeliveryStats::from_counts(by_status),
            generated_at: Utc::now(),
        };

        self.cache
            .write()
            .await
            .insert(tenant_id, (Instant::now(), report.clone()));
        Ok(report)
    }

    /// Drops the tenant's cached report.
    pub async fn clear_cache(&self, tenant_id: TenantId) {
        self.cache.write().await.remove(&tenant_id);
    }
}
