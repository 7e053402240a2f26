//! Builders shared by the unit tests.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::DispatchEngine;
use crate::models::{
    CreateEmailProvider, DigestFrequency, EmailProviderKind,
    EmailProviderSetting, TenantId, UpdatePreference, UserId,
};
use crate::providers::{
    DeliveryFailure, DeliveryReceipt, FailureReason, MockEmailAdapter, ProviderRegistry,
};
use crate::repository::Repositories;
use crate::router::ChannelRouter;
use crate::templates::EmailLayout;

pub fn provider_input(kind: EmailProviderKind) -> CreateEmailProvider {
    serde_json::from_value(json!({
        "provider": kind.to_string(),
        "fromEmail": "noreply@acme.test",
        "fromName": "Acme",
        "apiKey": "key-123",
        "apiSecret": "secret",
        "smtpHost": "smtp.acme.test",
        "smtpPort": 587,
        "configData": { "domain": "mg.acme.test", "region": "us-east-1" }
    }))
    .unwrap()
}

/// Stores a complete provider of `kind` for `tenant_id` and makes it active.
pub async fn activate_provider(
    repos: &Repositories,
    tenant_id: TenantId,
    kind: EmailProviderKind,
) -> EmailProviderSetting {
    let created = repos
        .providers
        .create(EmailProviderSetting::new(tenant_id, provider_input(kind)))
        .await
        .unwrap();
    assert!(repos.providers.activate(tenant_id, created.id).await.unwrap());
    repos.providers.get(tenant_id, created.id).await.unwrap().unwrap()
}

/// Registry whose `kind` adapter accepts every message.
pub fn stub_registry(kind: EmailProviderKind) -> ProviderRegistry {
    let mut adapter = MockEmailAdapter::new();
    adapter.expect_kind().return_const(kind);
    adapter
        .expect_send()
        .returning(|_, _| Ok(DeliveryReceipt::default()));
    ProviderRegistry::empty().with_adapter(Arc::new(adapter))
}

/// Registry whose `kind` adapter rejects every message.
pub fn rejecting_registry(kind: EmailProviderKind) -> ProviderRegistry {
    let mut adapter = MockEmailAdapter::new();
    adapter.expect_kind().return_const(kind);
    adapter
        .expect_send()
        .returning(|_, _| Err(DeliveryFailure::new(FailureReason::Rejected, "mailbox unavailable")));
    ProviderRegistry::empty().with_adapter(Arc::new(adapter))
}

pub fn dispatch_engine(repos: &Repositories, registry: ProviderRegistry) -> DispatchEngine {
    let router = ChannelRouter::new(
        repos.providers.clone(),
        repos.delivery_logs.clone(),
        registry,
        Duration::from_secs(1),
    );
    DispatchEngine::new(repos, router, EmailLayout::new().unwrap(), "Ledger")
}

pub fn preference(in_app: bool, email: bool) -> UpdatePreference {
    UpdatePreference {
        in_app_enabled: in_app,
        email_enabled: email,
        digest_frequency: DigestFrequency::Immediate,
        quiet_hours: false,
        quiet_start: None,
        quiet_end: None,
    }
}

/// Turns email on (and keeps in-app on) for one user and type.
pub async fn email_on(repos: &Repositories, tenant_id: TenantId, user_id: UserId, kind: &str) {
    repos
        .preferences
        .upsert(tenant_id, user_id, kind, preference(true, true))
        .await
        .unwrap();
}
