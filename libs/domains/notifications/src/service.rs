use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::analytics::Analytics;
use crate::conditions::Condition;
use crate::config::NotificationsConfig;
use crate::dispatch::DispatchEngine;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{
    AnalyticsReport, CreateEmailProvider, CreateNotification, CreateTrigger, DeliveryOutcome,
    DispatchRequest, EffectivePreference, EmailDeliveryLog, EmailLogQuery, EmailProviderSetting,
    EmailProviderView, EventOutcome, ListNotificationsQuery, MarkedRead, MentionRequest,
    Notification, NotificationTrigger, Page, TenantId, TestEmailRequest,
    TriggerEvent, UnreadCount, UpdateEmailProvider, UpdatePreference, UpdateTrigger, UserId,
};
use crate::preferences::PreferenceResolver;
use crate::providers::{ProviderRegistry, validate_settings};
use crate::recipients::RecipientSpec;
use crate::repository::Repositories;
use crate::router::ChannelRouter;
use crate::scheduler::DelayedDispatchWorker;
use crate::templates::{EmailLayout, render, variables_from_json};
use crate::trigger_engine::TriggerEngine;

const TEST_EMAIL_TITLE: &str = "Test email";

/// Tenant-scoped entry point used by the HTTP handlers and by in-process producers.
#[derive(Clone)]
pub struct NotificationService {
    repos: Repositories,
    config: NotificationsConfig,
    preferences: PreferenceResolver,
    router: ChannelRouter,
    layout: EmailLayout,
    dispatcher: DispatchEngine,
    triggers: TriggerEngine,
    analytics: Analytics,
    worker: DelayedDispatchWorker,
}

impl NotificationService {
    /// Service wired to the real vendor adapters.
    pub fn new(repos: Repositories, config: NotificationsConfig) -> NotificationResult<Self> {
        let client = Client::builder()
            .timeout(config.provider_timeout)
            .build()?;
        Self::with_registry(repos, config, ProviderRegistry::standard(client))
    }

    pub fn with_registry(
        repos: Repositories,
        config: NotificationsConfig,
        registry: ProviderRegistry,
    ) -> NotificationResult<Self> {
        let layout = EmailLayout::new()?;
        let router = ChannelRouter::new(
            repos.providers.clone(),
            repos.delivery_logs.clone(),
            registry,
            config.provider_timeout,
        );
        let dispatcher = DispatchEngine::new(&repos, router.clone(), layout.clone(), config.app_name.clone());
        let triggers = TriggerEngine::new(&repos, dispatcher.clone());
        let analytics = Analytics::new(
            repos.notifications.clone(),
            repos.delivery_logs.clone(),
            config.analytics_cache_ttl,
        );
        let worker = DelayedDispatchWorker::new(repos.scheduled.clone(), dispatcher.clone(), &config);

        Ok(Self {
            preferences: PreferenceResolver::new(repos.preferences.clone()),
            repos,
            config,
            router,
            layout,
            dispatcher,
            triggers,
            analytics,
            worker,
        })
    }

    /// Background worker for delayed trigger dispatches; the binary spawns it.
    pub fn worker(&self) -> DelayedDispatchWorker {
        self.worker.clone()
    }

    #[instrument(skip(self, query))]
    pub async fn list_notifications(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        query: ListNotificationsQuery,
    ) -> NotificationResult<Page<Notification>> {
        query.validate()?;
        let (items, total) = self
            .repos
            .notifications
            .list_for_user(tenant_id, user_id, &query)
            .await?;
        Ok(Page::new(items, total, query.page, query.limit))
    }

    pub async fn unread_count(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<UnreadCount> {
        let count = self.repos.notifications.unread_count(tenant_id, user_id).await?;
        Ok(UnreadCount { count })
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, tenant_id: TenantId, user_id: UserId, id: Uuid) -> NotificationResult<()> {
        if self.repos.notifications.mark_read(tenant_id, user_id, id).await? {
            Ok(())
        } else {
            Err(NotificationError::NotFound("Notification".to_string()))
        }
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, tenant_id: TenantId, user_id: UserId) -> NotificationResult<MarkedRead> {
        let updated = self.repos.notifications.mark_all_read(tenant_id, user_id).await?;
        Ok(MarkedRead { updated })
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_mark_read(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        ids: Vec<Uuid>,
    ) -> NotificationResult<MarkedRead> {
        let updated = self
            .repos
            .notifications
            .mark_many_read(tenant_id, user_id, ids)
            .await?;
        Ok(MarkedRead { updated })
    }

    /// Renders `templateVariables` into title, message and link, then dispatches.
    /// Preferences decide who actually receives it.
    #[instrument(
        skip(self, input),
        fields(notification_type = %input.notification_type, recipients = input.user_ids.len())
    )]
    pub async fn create_notification(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        input: CreateNotification,
    ) -> NotificationResult<Vec<Notification>> {
        input.validate()?;

        let raw_variables = input.template_variables.map(Value::Object);
        let vars = raw_variables
            .as_ref()
            .map(variables_from_json)
            .unwrap_or_default();

        let mut request = DispatchRequest::new(
            tenant_id,
            input.user_ids,
            input.notification_type,
            render(&input.title, &vars),
            render(&input.message_body, &vars),
        )
        .with_severity(input.severity)
        .with_link(input.link_url.map(|l| render(&l, &vars)))
        .with_channels(input.delivery_channels.unwrap_or_default())
        .with_creator(Some(created_by));
        request.related_module = input.related_module;
        request.related_entity_id = input.related_entity_id;
        request.template_variables = raw_variables;

        self.dispatcher.dispatch(request).await
    }

    pub async fn mention(
        &self,
        tenant_id: TenantId,
        author: UserId,
        input: MentionRequest,
    ) -> NotificationResult<Vec<Notification>> {
        input.validate()?;
        self.dispatcher.mention(tenant_id, author, input).await
    }

    /// Producer entry point. Never fails once the event itself is well-formed.
    pub async fn handle_event(&self, tenant_id: TenantId, event: TriggerEvent) -> NotificationResult<EventOutcome> {
        event.validate()?;
        Ok(self.triggers.on_event(tenant_id, &event).await)
    }

    pub async fn preferences(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> NotificationResult<Vec<EffectivePreference>> {
        self.preferences.effective_for_user(tenant_id, user_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_preference(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> NotificationResult<EffectivePreference> {
        let notification_type = notification_type.trim();
        if notification_type.is_empty() || notification_type.len() > 64 {
            return Err(NotificationError::invalid(
                "type",
                "Notification type must be 1 to 64 characters",
            ));
        }
        input.validate()?;
        self.preferences
            .update(tenant_id, user_id, notification_type, input)
            .await
    }

    pub async fn list_providers(&self, tenant_id: TenantId) -> NotificationResult<Vec<EmailProviderView>> {
        let providers = self.repos.providers.list(tenant_id).await?;
        Ok(providers.iter().map(EmailProviderSetting::masked).collect())
    }

    pub async fn get_provider(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<EmailProviderView> {
        Ok(self.load_provider(tenant_id, id).await?.masked())
    }

    #[instrument(skip(self, input), fields(provider = %input.provider, activate = input.is_active))]
    pub async fn create_provider(
        &self,
        tenant_id: TenantId,
        input: CreateEmailProvider,
    ) -> NotificationResult<EmailProviderView> {
        input.validate()?;
        let activate = input.is_active;
        let setting = EmailProviderSetting::new(tenant_id, input);
        ensure_valid(&setting)?;

        let created = self.repos.providers.create(setting).await?;
        info!(provider_id = %created.id, "Created email provider");
        if activate {
            self.repos.providers.activate(tenant_id, created.id).await?;
        }
        self.get_provider(tenant_id, created.id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_provider(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        input: UpdateEmailProvider,
    ) -> NotificationResult<EmailProviderView> {
        input.validate()?;
        let next = self.load_provider(tenant_id, id).await?.with_update(&input);
        ensure_valid(&next)?;

        self.repos
            .providers
            .update(next)
            .await?
            .ok_or_else(|| NotificationError::NotFound("Email provider".to_string()))?;
        match input.is_active {
            Some(true) => {
                self.repos.providers.activate(tenant_id, id).await?;
            }
            Some(false) => {
                self.repos.providers.deactivate(tenant_id, id).await?;
            }
            None => {}
        }
        self.get_provider(tenant_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_provider(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<()> {
        if self.repos.providers.delete(tenant_id, id).await? {
            info!("Deleted email provider");
            Ok(())
        } else {
            Err(NotificationError::NotFound("Email provider".to_string()))
        }
    }

    /// Sends a fixed message through the provider, active or not. The attempt is
    /// logged like any other delivery.
    #[instrument(skip(self, input))]
    pub async fn test_provider(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        input: TestEmailRequest,
    ) -> NotificationResult<DeliveryOutcome> {
        input.validate()?;
        let settings = self.load_provider(tenant_id, id).await?;
        let message = format!(
            "This is a test email from {}. Your {} provider is configured correctly.",
            self.config.app_name, settings.provider
        );
        let email = self
            .layout
            .render(&self.config.app_name, TEST_EMAIL_TITLE, &message, None)?;
        Ok(self.router.send_with(&settings, &input.to_email, email, None).await)
    }

    async fn load_provider(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<EmailProviderSetting> {
        self.repos
            .providers
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| NotificationError::NotFound("Email provider".to_string()))
    }

    pub async fn list_triggers(&self, tenant_id: TenantId) -> NotificationResult<Vec<NotificationTrigger>> {
        self.repos.triggers.list(tenant_id).await
    }

    pub async fn get_trigger(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<NotificationTrigger> {
        self.repos
            .triggers
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| NotificationError::NotFound("Trigger".to_string()))
    }

    #[instrument(skip(self, input), fields(module = %input.trigger_module, event = %input.trigger_event))]
    pub async fn create_trigger(
        &self,
        tenant_id: TenantId,
        created_by: UserId,
        input: CreateTrigger,
    ) -> NotificationResult<NotificationTrigger> {
        input.validate()?;
        let trigger = NotificationTrigger::new(tenant_id, created_by, input);
        check_trigger(&trigger)?;

        let created = self.repos.triggers.create(trigger).await?;
        info!(trigger_id = %created.id, "Created notification trigger");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_trigger(
        &self,
        tenant_id: TenantId,
        id: Uuid,
        input: UpdateTrigger,
    ) -> NotificationResult<NotificationTrigger> {
        input.validate()?;
        let mut trigger = self.get_trigger(tenant_id, id).await?;
        trigger.apply(input);
        check_trigger(&trigger)?;

        self.repos
            .triggers
            .update(trigger)
            .await?
            .ok_or_else(|| NotificationError::NotFound("Trigger".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete_trigger(&self, tenant_id: TenantId, id: Uuid) -> NotificationResult<()> {
        if self.repos.triggers.delete(tenant_id, id).await? {
            Ok(())
        } else {
            Err(NotificationError::NotFound("Trigger".to_string()))
        }
    }

    pub async fn email_logs(
        &self,
        tenant_id: TenantId,
        query: EmailLogQuery,
    ) -> NotificationResult<Page<EmailDeliveryLog>> {
        query.validate()?;
        let (items, total) = self.repos.delivery_logs.list(tenant_id, &query).await?;
        Ok(Page::new(items, total, query.page, query.limit))
    }

    pub async fn analytics(&self, tenant_id: TenantId) -> NotificationResult<AnalyticsReport> {
        self.analytics.report(tenant_id).await
    }

    pub async fn clear_cache(&self, tenant_id: TenantId) {
        self.analytics.clear_cache(tenant_id).await;
    }
}

fn ensure_valid(setting: &EmailProviderSetting) -> NotificationResult<()> {
    let validation = validate_settings(setting);
    if validation.is_valid {
        Ok(())
    } else {
        Err(NotificationError::invalid_many(
            "Invalid email provider configuration",
            validation.errors,
        ))
    }
}

/// Rejects triggers whose recipient config or conditions would never parse at
/// event time.
fn check_trigger(trigger: &NotificationTrigger) -> NotificationResult<()> {
    RecipientSpec::parse(trigger.recipient_type, &trigger.recipient_config)
        .map_err(|e| NotificationError::invalid("recipientConfig", e.to_string()))?;
    if let Some(conditions) = &trigger.trigger_conditions {
        Condition::parse(conditions)
            .map_err(|e| NotificationError::invalid("triggerConditions", e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::models::{DeliveryStatus, DirectoryUser, EmailProviderKind};
    use crate::testing::{email_on, preference, provider_input, stub_registry};
    use serde_json::json;

    fn service(repos: &Repositories, kind: EmailProviderKind) -> NotificationService {
        NotificationService::with_registry(repos.clone(), NotificationsConfig::default(), stub_registry(kind))
            .unwrap()
    }

    fn notification(body: Value) -> CreateNotification {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn create_renders_template_variables_before_dispatch() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);

        let created = svc
            .create_notification(
                5,
                1,
                notification(json!({
                    "userIds": [9, 9, 10],
                    "title": "Invoice {{number}}",
                    "messageBody": "Due {{ due }} for {{customer.name}}",
                    "linkUrl": "https://app.test/invoices/{{number}}",
                    "type": "INVOICE_CREATED",
                    "templateVariables": { "number": "INV-7", "due": "2026-11-01", "customer": { "name": "Acme" } }
                })),
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].title, "Invoice INV-7");
        assert_eq!(created[0].message_body, "Due 2026-11-01 for Acme");
        assert_eq!(created[0].link_url.as_deref(), Some("https://app.test/invoices/INV-7"));
        assert_eq!(created[0].created_by, Some(1));
        assert_eq!(created[0].template_variables.as_ref().unwrap()["number"], "INV-7");
    }

    #[tokio::test]
    async fn create_rejects_missing_recipients() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);
        let err = svc
            .create_notification(
                5,
                1,
                notification(json!({ "userIds": [], "title": "t", "messageBody": "b", "type": "SYSTEM" })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Validation { .. }));
    }

    #[tokio::test]
    async fn mark_read_of_foreign_notification_is_not_found() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);
        let created = svc
            .create_notification(
                5,
                1,
                notification(json!({ "userIds": [9], "title": "t", "messageBody": "b", "type": "SYSTEM" })),
            )
            .await
            .unwrap();

        let err = svc.mark_read(5, 10, created[0].id).await.unwrap_err();
        assert!(matches!(err, NotificationError::NotFound(_)));
        svc.mark_read(5, 9, created[0].id).await.unwrap();
        assert_eq!(svc.unread_count(5, 9).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn mark_all_read_is_idempotent() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);
        svc.create_notification(
            5,
            1,
            notification(json!({ "userIds": [9], "title": "a", "messageBody": "b", "type": "SYSTEM" })),
        )
        .await
        .unwrap();
        svc.create_notification(
            5,
            1,
            notification(json!({ "userIds": [9], "title": "c", "messageBody": "d", "type": "SYSTEM" })),
        )
        .await
        .unwrap();

        assert_eq!(svc.mark_all_read(5, 9).await.unwrap().updated, 2);
        assert_eq!(svc.mark_all_read(5, 9).await.unwrap().updated, 0);
        assert_eq!(svc.unread_count(5, 9).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn activating_one_provider_deactivates_the_other() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);

        let mut sendgrid = provider_input(EmailProviderKind::Sendgrid);
        sendgrid.is_active = true;
        let sendgrid = svc.create_provider(5, sendgrid).await.unwrap();
        assert!(sendgrid.is_active);

        let mut mailgun = provider_input(EmailProviderKind::Mailgun);
        mailgun.is_active = true;
        let mailgun = svc.create_provider(5, mailgun).await.unwrap();

        let listed = svc.list_providers(5).await.unwrap();
        let active: Vec<_> = listed.iter().filter(|p| p.is_active).map(|p| p.id).collect();
        assert_eq!(active, vec![mailgun.id]);

        svc.update_provider(
            5,
            sendgrid.id,
            UpdateEmailProvider {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let active: Vec<_> = svc
            .list_providers(5)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| p.id)
            .collect();
        assert_eq!(active, vec![sendgrid.id]);
    }

    #[tokio::test]
    async fn provider_views_mask_secrets_and_masked_updates_keep_them() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Ses);

        let view = svc.create_provider(5, provider_input(EmailProviderKind::Ses)).await.unwrap();
        assert_eq!(view.api_key, "********");
        assert_eq!(view.api_secret.as_deref(), Some("********"));

        svc.update_provider(
            5,
            view.id,
            UpdateEmailProvider {
                api_key: Some("********".into()),
                from_name: Some("Billing".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stored = repos.providers.get(5, view.id).await.unwrap().unwrap();
        assert_eq!(stored.api_key, "key-123");
        assert_eq!(stored.from_name, "Billing");
    }

    #[tokio::test]
    async fn mailgun_without_domain_is_rejected() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Mailgun);
        let mut input = provider_input(EmailProviderKind::Mailgun);
        input.config_data = None;

        let err = svc.create_provider(5, input).await.unwrap_err();
        match err {
            NotificationError::Validation { fields, .. } => {
                assert_eq!(fields["errors"][0], "Mailgun domain is required in configData");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(svc.list_providers(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_is_logged() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);
        let view = svc.create_provider(5, provider_input(EmailProviderKind::Smtp)).await.unwrap();

        let outcome = svc
            .test_provider(
                5,
                view.id,
                TestEmailRequest {
                    to_email: "ops@acme.test".into(),
                },
            )
            .await
            .unwrap();
        assert!(outcome.success);

        let logs = svc.email_logs(5, EmailLogQuery::default()).await.unwrap();
        assert_eq!(logs.total, 1);
        assert_eq!(logs.items[0].status, DeliveryStatus::Sent);
        assert_eq!(logs.items[0].subject, TEST_EMAIL_TITLE);
        assert_eq!(logs.items[0].id, outcome.log_id.unwrap());
    }

    #[tokio::test]
    async fn triggers_with_unparseable_config_are_rejected() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);
        let input: CreateTrigger = serde_json::from_value(json!({
            "triggerName": "overdue",
            "triggerModule": "tasks",
            "triggerEvent": "overdue",
            "notificationType": "TASK_OVERDUE",
            "titleTemplate": "{{taskName}} is overdue",
            "messageTemplate": "Please review",
            "recipientType": "role_based",
            "recipientConfig": {}
        }))
        .unwrap();

        let err = svc.create_trigger(5, 1, input.clone()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Validation { .. }));

        let mut fixed = input;
        fixed.recipient_config = json!({ "role": "accountant" });
        fixed.trigger_conditions = Some(json!({ "field": "priority", "operator": "between", "value": 1 }));
        assert!(svc.create_trigger(5, 1, fixed.clone()).await.is_err());

        fixed.trigger_conditions = Some(json!({ "field": "priority", "operator": "eq", "value": "high" }));
        let created = svc.create_trigger(5, 1, fixed).await.unwrap();
        assert_eq!(svc.list_triggers(5).await.unwrap().len(), 1);

        let updated = svc
            .update_trigger(
                5,
                created.id,
                UpdateTrigger {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);

        svc.delete_trigger(5, created.id).await.unwrap();
        assert!(matches!(
            svc.get_trigger(5, created.id).await,
            Err(NotificationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn event_fans_out_and_email_follows_preferences() {
        let directory = InMemoryUserDirectory::new();
        directory.insert(DirectoryUser::new(5, 9, "Dana", "accountant").with_email("dana@acme.test")).await;
        directory.insert(DirectoryUser::new(5, 10, "Lee", "clerk").with_email("lee@acme.test")).await;
        let repos = Repositories::in_memory_with_directory(directory);
        let svc = service(&repos, EmailProviderKind::Smtp);

        let mut smtp = provider_input(EmailProviderKind::Smtp);
        smtp.is_active = true;
        svc.create_provider(5, smtp).await.unwrap();
        email_on(&repos, 5, 9, "TASK_OVERDUE").await;

        let trigger: CreateTrigger = serde_json::from_value(json!({
            "triggerName": "overdue",
            "triggerModule": "tasks",
            "triggerEvent": "overdue",
            "notificationType": "TASK_OVERDUE",
            "titleTemplate": "{{taskName}} is overdue",
            "messageTemplate": "Please review {{taskName}}",
            "recipientType": "all_users",
            "deliveryChannels": ["in_app", "email"]
        }))
        .unwrap();
        svc.create_trigger(5, 1, trigger).await.unwrap();

        let outcome = svc
            .handle_event(
                5,
                TriggerEvent {
                    module: "tasks".into(),
                    event: "overdue".into(),
                    payload: json!({ "taskName": "Audit" }),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.dispatched, 1);
        assert_eq!(outcome.notifications, 2);

        let page = svc
            .list_notifications(5, 10, ListNotificationsQuery::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].title, "Audit is overdue");

        let logs = svc.email_logs(5, EmailLogQuery::default()).await.unwrap();
        assert_eq!(logs.total, 1);
        assert_eq!(logs.items[0].recipient_email, "dana@acme.test");

        let report = svc.analytics(5).await.unwrap();
        assert_eq!(report.notifications.total, 2);
        assert_eq!(report.email_delivery.by_status["sent"], 1);
    }

    #[tokio::test]
    async fn preferences_fill_defaults_and_validate_type() {
        let repos = Repositories::in_memory();
        let svc = service(&repos, EmailProviderKind::Smtp);

        let updated = svc
            .update_preference(5, 9, "INVOICE_CREATED", preference(true, true))
            .await
            .unwrap();
        assert!(updated.email_enabled);
        assert!(!updated.is_default);

        let all = svc.preferences(5, 9).await.unwrap();
        let invoice = all.iter().find(|p| p.notification_type == "INVOICE_CREATED").unwrap();
        assert!(invoice.email_enabled);
        let task = all.iter().find(|p| p.notification_type == "TASK_ASSIGNMENT").unwrap();
        assert!(task.is_default && task.in_app_enabled && !task.email_enabled);

        assert!(
            svc.update_preference(5, 9, "  ", preference(true, false))
                .await
                .is_err()
        );
    }
}
