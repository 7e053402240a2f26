//! Turns producer events into dispatches through the tenant's active triggers.

use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::conditions;
use crate::dispatch::DispatchEngine;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{DispatchRequest, EventOutcome, NotificationTrigger, TenantId, TriggerEvent};
use crate::recipients::{RecipientResolver, RecipientSpec, trigger_variables};
use crate::repository::{Repositories, ScheduledDispatchRepository, TriggerRepository};
use crate::templates::{Template, Variables, variables_from_json};

enum Fired {
    Dispatched(usize),
    Scheduled,
    Skipped,
}

#[derive(Clone)]
pub struct TriggerEngine {
    triggers: Arc<dyn TriggerRepository>,
    scheduled: Arc<dyn ScheduledDispatchRepository>,
    resolver: RecipientResolver,
    dispatcher: DispatchEngine,
}

impl TriggerEngine {
    pub fn new(repos: &Repositories, dispatcher: DispatchEngine) -> Self {
        Self {
            triggers: repos.triggers.clone(),
            scheduled: repos.scheduled.clone(),
            resolver: RecipientResolver::new(repos.directory.clone()),
            dispatcher,
        }
    }

    /// Runs every matching trigger. Never fails: problems are logged and
    /// counted so one bad trigger cannot block the others or the producer.
    #[instrument(skip(self, event), fields(module = %event.module, event = %event.event))]
    pub async fn on_event(&self, tenant_id: TenantId, event: &TriggerEvent) -> EventOutcome {
        let mut outcome = EventOutcome::default();

        let triggers = match self
            .triggers
            .find_active(tenant_id, &event.module, &event.event)
            .await
        {
            Ok(triggers) => triggers,
            Err(e) => {
                warn!(error = %e, "Failed to load triggers for event");
                return outcome;
            }
        };
        outcome.matched = triggers.len();

        for trigger in &triggers {
            match self.fire(tenant_id, trigger, &event.payload).await {
                Ok(Fired::Dispatched(count)) => {
                    outcome.dispatched += 1;
                    outcome.notifications += count;
                }
                Ok(Fired::Scheduled) => outcome.scheduled += 1,
                Ok(Fired::Skipped) => outcome.skipped += 1,
                Err(e @ (NotificationError::Condition(_) | NotificationError::RecipientResolution(_))) => {
                    warn!(trigger_id = %trigger.id, error = %e, "Skipping misconfigured trigger");
                    outcome.skipped += 1;
                }
                Err(e) => {
                    warn!(trigger_id = %trigger.id, error = %e, "Trigger failed");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            matched = outcome.matched,
            dispatched = outcome.dispatched,
            scheduled = outcome.scheduled,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Event processed"
        );
        outcome
    }

    #[instrument(skip_all, fields(trigger_id = %trigger.id))]
    async fn fire(
        &self,
        tenant_id: TenantId,
        trigger: &NotificationTrigger,
        payload: &Value,
    ) -> NotificationResult<Fired> {
        if !conditions::matches(trigger.trigger_conditions.as_ref(), payload)? {
            debug!("Trigger conditions not met");
            return Ok(Fired::Skipped);
        }

        let spec = RecipientSpec::parse(trigger.recipient_type, &trigger.recipient_config)?;
        let recipients = self.resolver.resolve(tenant_id, &spec, payload).await?;
        if recipients.is_empty() {
            debug!("Trigger resolved no recipients");
            return Ok(Fired::Skipped);
        }

        let mut vars = trigger_variables(&trigger.recipient_config);
        vars.extend(variables_from_json(payload));

        let mut request = DispatchRequest::new(
            tenant_id,
            recipients,
            trigger.notification_type.clone(),
            render_checked("title", &trigger.title_template, &vars),
            render_checked("message", &trigger.message_template, &vars),
        )
        .with_severity(trigger.severity)
        .with_link(
            trigger
                .link_template
                .as_deref()
                .map(|t| render_checked("link", t, &vars)),
        )
        .with_channels(trigger.delivery_channels.clone())
        .with_creator(Some(trigger.created_by));
        request.related_module = Some(trigger.trigger_module.clone());
        request.template_variables = Some(payload.clone()).filter(Value::is_object);
        request.batch_delivery = trigger.batch_delivery;

        if trigger.delivery_delay > 0 {
            let due_at = Utc::now() + Duration::minutes(i64::from(trigger.delivery_delay));
            self.scheduled
                .enqueue(tenant_id, Some(trigger.id), request, due_at)
                .await?;
            debug!(%due_at, "Dispatch scheduled");
            return Ok(Fired::Scheduled);
        }

        let created = self.dispatcher.dispatch(request).await?;
        Ok(Fired::Dispatched(created.len()))
    }
}

/// Renders `source`, noting placeholders the event did not supply.
fn render_checked(part: &str, source: &str, vars: &Variables) -> String {
    let template = Template::parse(source);
    let missing = template.missing(vars);
    if !missing.is_empty() {
        debug!(part, ?missing, "Template variables not supplied");
    }
    template.render(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::models::{
        CreateTrigger, DirectoryUser, EmailProviderKind, ListNotificationsQuery, ScheduleStatus,
    };
    use crate::repository::InMemoryScheduledDispatchRepository;
    use crate::testing::{dispatch_engine, stub_registry};
    use serde_json::json;

    async fn repos() -> Repositories {
        let directory = InMemoryUserDirectory::new();
        for (id, name, role) in [(9, "Dana", "accountant"), (10, "Lee", "manager")] {
            directory.insert(DirectoryUser::new(5, id, name, role)).await;
        }
        directory
            .insert(DirectoryUser::new(5, 12, "Gone", "accountant").inactive())
            .await;
        directory.insert(DirectoryUser::new(6, 20, "Other", "accountant")).await;
        Repositories::in_memory_with_directory(directory)
    }

    fn engine(repos: &Repositories) -> TriggerEngine {
        TriggerEngine::new(repos, dispatch_engine(repos, stub_registry(EmailProviderKind::Smtp)))
    }

    async fn add_trigger(repos: &Repositories, extra: Value) -> NotificationTrigger {
        let mut body = json!({
            "triggerName": "Overdue tasks",
            "triggerModule": "tasks",
            "triggerEvent": "overdue",
            "notificationType": "TASK_OVERDUE",
            "titleTemplate": "{{taskName}} is overdue",
            "messageTemplate": "{{ taskName }} was due {{dueDate}} ({{priority}})",
            "recipientType": "all_users"
        });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), extra) {
            target.extend(extra);
        }
        let input: CreateTrigger = serde_json::from_value(body).unwrap();
        repos
            .triggers
            .create(NotificationTrigger::new(5, 1, input))
            .await
            .unwrap()
    }

    fn overdue(payload: Value) -> TriggerEvent {
        TriggerEvent {
            module: "tasks".into(),
            event: "overdue".into(),
            payload,
        }
    }

    async fn titles(repos: &Repositories, user: i64) -> Vec<String> {
        repos
            .notifications
            .list_for_user(5, user, &ListNotificationsQuery::default())
            .await
            .unwrap()
            .0
            .into_iter()
            .map(|n| n.title)
            .collect()
    }

    #[tokio::test]
    async fn all_users_trigger_notifies_every_active_tenant_user() {
        let repos = repos().await;
        add_trigger(&repos, json!({})).await;

        let outcome = engine(&repos)
            .on_event(5, &overdue(json!({ "taskName": "Audit" })))
            .await;

        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.dispatched, 1);
        assert_eq!(outcome.notifications, 2);
        assert_eq!(titles(&repos, 9).await, vec!["Audit is overdue"]);
        assert_eq!(titles(&repos, 10).await, vec!["Audit is overdue"]);
        assert!(titles(&repos, 12).await.is_empty());
    }

    #[tokio::test]
    async fn payload_overrides_trigger_constants_and_unknown_placeholders_survive() {
        let repos = repos().await;
        add_trigger(
            &repos,
            json!({
                "recipientType": "specific_users",
                "recipientConfig": {
                    "userIds": [9],
                    "variables": { "taskName": "Default", "priority": "high" }
                }
            }),
        )
        .await;

        engine(&repos)
            .on_event(5, &overdue(json!({ "taskName": "Audit" })))
            .await;

        let rows = repos
            .notifications
            .list_for_user(5, 9, &ListNotificationsQuery::default())
            .await
            .unwrap()
            .0;
        assert_eq!(rows[0].title, "Audit is overdue");
        assert_eq!(rows[0].message_body, "Audit was due {{dueDate}} (high)");
        assert_eq!(rows[0].related_module.as_deref(), Some("tasks"));
        assert_eq!(rows[0].created_by, Some(1));
    }

    #[tokio::test]
    async fn unmet_conditions_skip_the_trigger() {
        let repos = repos().await;
        add_trigger(
            &repos,
            json!({ "triggerConditions": { "field": "daysOverdue", "operator": "gte", "value": 3 } }),
        )
        .await;

        let outcome = engine(&repos)
            .on_event(5, &overdue(json!({ "taskName": "Audit", "daysOverdue": 1 })))
            .await;
        assert_eq!(outcome.skipped, 1);
        assert!(titles(&repos, 9).await.is_empty());
    }

    #[tokio::test]
    async fn bad_trigger_does_not_block_the_rest() {
        let repos = repos().await;
        add_trigger(
            &repos,
            json!({ "recipientType": "role_based", "recipientConfig": { "role": 42 } }),
        )
        .await;
        add_trigger(
            &repos,
            json!({ "triggerConditions": { "field": "x", "operator": "between" } }),
        )
        .await;
        add_trigger(
            &repos,
            json!({ "recipientType": "role_based", "recipientConfig": { "role": "manager" } }),
        )
        .await;

        let outcome = engine(&repos)
            .on_event(5, &overdue(json!({ "taskName": "Audit" })))
            .await;
        assert_eq!(outcome.matched, 3);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.dispatched, 1);
        assert_eq!(titles(&repos, 10).await.len(), 1);
        assert!(titles(&repos, 9).await.is_empty());
    }

    #[tokio::test]
    async fn empty_role_is_a_quiet_no_op() {
        let repos = repos().await;
        add_trigger(
            &repos,
            json!({ "recipientType": "role_based", "recipientConfig": { "role": "auditor" } }),
        )
        .await;

        let outcome = engine(&repos).on_event(5, &overdue(json!({}))).await;
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn delayed_trigger_is_queued_not_sent() {
        let scheduled = InMemoryScheduledDispatchRepository::new();
        let mut repos = repos().await;
        repos.scheduled = Arc::new(scheduled.clone());
        let trigger = add_trigger(&repos, json!({ "deliveryDelay": 15, "batchDelivery": true })).await;

        let before = Utc::now();
        let outcome = engine(&repos)
            .on_event(5, &overdue(json!({ "taskName": "Audit" })))
            .await;
        assert_eq!(outcome.scheduled, 1);
        assert!(titles(&repos, 9).await.is_empty());

        let queued = scheduled.all().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].trigger_id, Some(trigger.id));
        assert_eq!(queued[0].status, ScheduleStatus::Pending);
        assert!(queued[0].due_at >= before + Duration::minutes(15));
        let request: DispatchRequest = serde_json::from_value(queued[0].request.clone()).unwrap();
        assert_eq!(request.title, "Audit is overdue");
        assert!(request.batch_delivery);
    }

    #[tokio::test]
    async fn other_events_and_inactive_triggers_do_not_fire() {
        let repos = repos().await;
        add_trigger(&repos, json!({ "isActive": false })).await;
        add_trigger(&repos, json!({ "triggerEvent": "created" })).await;

        let outcome = engine(&repos).on_event(5, &overdue(json!({}))).await;
        assert_eq!(outcome, EventOutcome::default());
    }
}
