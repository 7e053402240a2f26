use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::warn;

use super::{
    DeliveryFailure, DeliveryReceipt, EmailAdapter, EmailMessage, FailureReason, MailgunAdapter,
    PostmarkAdapter, ResendAdapter, SendGridAdapter, SesAdapter, SmtpAdapter,
};
use crate::models::{EmailProviderKind, EmailProviderSetting};

/// Adapter lookup by vendor.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<EmailProviderKind, Arc<dyn EmailAdapter>>,
}

impl ProviderRegistry {
    /// Registry with no adapters; every send fails as not implemented.
    pub fn empty() -> Self {
        Self::default()
    }

    /// All supported vendors. HTTP vendors share `client`.
    pub fn standard(client: Client) -> Self {
        Self::empty()
            .with_adapter(Arc::new(SendGridAdapter::new(client.clone())))
            .with_adapter(Arc::new(MailgunAdapter::new(client.clone())))
            .with_adapter(Arc::new(PostmarkAdapter::new(client.clone())))
            .with_adapter(Arc::new(ResendAdapter::new(client)))
            .with_adapter(Arc::new(SmtpAdapter::new()))
            .with_adapter(Arc::new(SesAdapter::new()))
    }

    /// Registers `adapter` under its own kind, replacing any previous one.
    pub fn with_adapter(mut self, adapter: Arc<dyn EmailAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn get(&self, kind: EmailProviderKind) -> Option<Arc<dyn EmailAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub async fn send(
        &self,
        settings: &EmailProviderSetting,
        message: &EmailMessage,
    ) -> Result<DeliveryReceipt, DeliveryFailure> {
        match self.adapters.get(&settings.provider) {
            Some(adapter) => adapter.send(settings, message).await,
            None => {
                warn!(provider = %settings.provider, "No adapter registered for email provider");
                Err(DeliveryFailure::new(
                    FailureReason::NotImplemented,
                    format!("{} provider not implemented", settings.provider),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockEmailAdapter;
    use crate::providers::fixtures::{message, settings};
    use serde_json::json;
    use sea_orm::Iterable;

    #[test]
    fn standard_covers_every_vendor() {
        let registry = ProviderRegistry::standard(Client::new());
        for kind in EmailProviderKind::iter() {
            let adapter = registry.get(kind).expect("adapter registered");
            assert_eq!(adapter.kind(), kind);
        }
    }

    #[tokio::test]
    async fn unregistered_vendor_is_not_implemented() {
        let settings = settings("POSTMARK", json!({}));
        let failure = ProviderRegistry::empty()
            .send(&settings, &message(&settings))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotImplemented);
    }

    #[tokio::test]
    async fn dispatches_to_adapter_by_kind() {
        let mut adapter = MockEmailAdapter::new();
        adapter.expect_kind().return_const(EmailProviderKind::Postmark);
        adapter.expect_send().times(1).returning(|_, _| {
            Ok(DeliveryReceipt {
                message_id: Some("m-1".into()),
            })
        });
        let registry = ProviderRegistry::empty().with_adapter(Arc::new(adapter));

        let settings = settings("POSTMARK", json!({}));
        let receipt = registry.send(&settings, &message(&settings)).await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("m-1"));
    }
}
