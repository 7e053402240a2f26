//! Email channel: picks the tenant's active provider, sends through its adapter
//! and records one delivery log row per attempt.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{
    DeliveryOutcome, DeliveryStatus, EmailProviderSetting, NewDeliveryLog, TenantId,
};
use crate::providers::{DeliveryFailure, EmailMessage, ProviderRegistry, validate_settings};
use crate::repository::{DeliveryLogRepository, ProviderRepository};
use crate::templates::RenderedEmail;

/// One rendered email bound for one address.
#[derive(Debug, Clone)]
pub struct EmailDelivery {
    pub to: String,
    pub notification_id: Option<Uuid>,
    pub email: RenderedEmail,
}

#[derive(Clone)]
pub struct ChannelRouter {
    providers: Arc<dyn ProviderRepository>,
    logs: Arc<dyn DeliveryLogRepository>,
    registry: ProviderRegistry,
    timeout: Duration,
}

impl ChannelRouter {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        logs: Arc<dyn DeliveryLogRepository>,
        registry: ProviderRegistry,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            logs,
            registry,
            timeout,
        }
    }

    /// Sends every delivery through the tenant's active provider in parallel.
    /// Returns nothing when the tenant has no usable provider.
    #[instrument(skip(self, deliveries), fields(count = deliveries.len()))]
    pub async fn deliver(
        &self,
        tenant_id: TenantId,
        deliveries: Vec<EmailDelivery>,
    ) -> Vec<DeliveryOutcome> {
        if deliveries.is_empty() {
            return Vec::new();
        }

        let settings = match self.providers.active(tenant_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No active email provider, skipping email channel");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to load active email provider, skipping email channel");
                return Vec::new();
            }
        };

        let validation = validate_settings(&settings);
        if !validation.is_valid {
            warn!(
                provider = %settings.provider,
                errors = ?validation.errors,
                "Active email provider is misconfigured, skipping email channel"
            );
            return Vec::new();
        }

        let settings = &settings;
        join_all(deliveries.into_iter().map(|delivery| async move {
            self.send_with(settings, &delivery.to, delivery.email, delivery.notification_id)
                .await
        }))
        .await
    }

    /// One bounded attempt through `settings`, logged whatever the result.
    #[instrument(skip(self, settings, email), fields(provider = %settings.provider))]
    pub async fn send_with(
        &self,
        settings: &EmailProviderSetting,
        to: &str,
        email: RenderedEmail,
        notification_id: Option<Uuid>,
    ) -> DeliveryOutcome {
        let message = EmailMessage::new(settings, to, email);

        let result = match tokio::time::timeout(self.timeout, self.registry.send(settings, &message)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryFailure::timeout()),
        };

        let (status, error_message) = match &result {
            Ok(_) => (DeliveryStatus::Sent, None),
            Err(failure) => {
                warn!(to, reason = %failure.reason, error = %failure.message, "Email delivery failed");
                (DeliveryStatus::Failed, Some(failure.log_message()))
            }
        };

        let log = NewDeliveryLog {
            tenant_id: settings.tenant_id,
            provider_id: Some(settings.id),
            recipient_email: to.to_string(),
            subject: message.subject.clone(),
            status,
            error_message: error_message.clone(),
            notification_id,
        };
        let log_id = match self.logs.record(log).await {
            Ok(row) => Some(row.id),
            Err(e) => {
                warn!(to, error = %e, "Failed to record email delivery log");
                None
            }
        };

        DeliveryOutcome {
            success: result.is_ok(),
            error_message,
            log_id,
        }
    }
}
