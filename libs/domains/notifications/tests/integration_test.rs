//! Postgres-backed tests for the notifications domain
//!
//! Each test starts a throwaway PostgreSQL container with the schema applied,
//! so they need Docker and are ignored by default:
//!
//! ```sh
//! cargo test -p domain_notifications --test integration_test -- --ignored
//! ```

use chrono::{Duration, Utc};
use domain_notifications::models::{
    CreateEmailProvider, CreateNotification, CreateTrigger, DeliveryStatus, EmailLogQuery,
    ListNotificationsQuery, UpdatePreference,
};
use domain_notifications::*;
use serde_json::json;
use test_utils::{TestDataBuilder, TestDatabase};

fn service(db: &TestDatabase) -> NotificationService {
    NotificationService::with_registry(
        Repositories::postgres(db.connection()),
        NotificationsConfig::default(),
        ProviderRegistry::empty(),
    )
    .unwrap()
}

fn provider(kind: &str, active: bool) -> CreateEmailProvider {
    serde_json::from_value(json!({
        "provider": kind,
        "fromEmail": "noreply@acme.test",
        "fromName": "Acme",
        "apiKey": "key-123",
        "smtpHost": "smtp.acme.test",
        "smtpPort": 587,
        "configData": { "domain": "mg.acme.test" },
        "isActive": active
    }))
    .unwrap()
}

fn notification(user_id: i64, kind: &str) -> CreateNotification {
    serde_json::from_value(json!({
        "userIds": [user_id],
        "title": "Hello",
        "messageBody": "World",
        "type": kind
    }))
    .unwrap()
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_default_preferences_write_one_unread_row_and_no_email() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("pg_default_preferences");
    let (tenant, user) = (data.tenant_id(), data.user_id(9));
    db.seed_user(tenant, user, "Dana", "accountant", None).await;
    let svc = service(&db);

    let created = svc
        .create_notification(tenant, data.user_id(1), notification(user, "TASK_ASSIGNMENT"))
        .await
        .unwrap();
    assert_eq!(created.len(), 1);

    let page = svc
        .list_notifications(tenant, user, ListNotificationsQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(!page.items[0].is_read);
    assert_eq!(svc.unread_count(tenant, user).await.unwrap().count, 1);

    let logs = svc.email_logs(tenant, EmailLogQuery::default()).await.unwrap();
    assert_eq!(logs.total, 0);

    assert_eq!(svc.mark_all_read(tenant, user).await.unwrap().updated, 1);
    assert_eq!(svc.mark_all_read(tenant, user).await.unwrap().updated, 0);
    assert_eq!(svc.unread_count(tenant, user).await.unwrap().count, 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_multi_recipient_dispatch_returns_one_row_per_user() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("pg_batch_insert");
    let tenant = data.tenant_id();
    let users: Vec<i64> = (1..=3).map(|n| data.user_id(n)).collect();
    let svc = service(&db);

    let mut input = notification(users[0], "SYSTEM");
    input.user_ids = users.clone();
    let created = svc
        .create_notification(tenant, data.user_id(9), input)
        .await
        .unwrap();

    let mut recipients: Vec<i64> = created.iter().map(|n| n.user_id).collect();
    recipients.sort();
    assert_eq!(recipients, users);
    for user in &users {
        assert_eq!(svc.unread_count(tenant, *user).await.unwrap().count, 1);
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_activation_leaves_exactly_one_active_provider() {
    let db = TestDatabase::new().await;
    let tenant = TestDataBuilder::from_test_name("pg_activation").tenant_id();
    let svc = service(&db);

    let sendgrid = svc.create_provider(tenant, provider("SENDGRID", true)).await.unwrap();
    let mailgun = svc.create_provider(tenant, provider("MAILGUN", true)).await.unwrap();

    let active: Vec<_> = svc
        .list_providers(tenant)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.is_active)
        .map(|p| p.id)
        .collect();
    assert_eq!(active, vec![mailgun.id]);
    assert!(!svc.get_provider(tenant, sendgrid.id).await.unwrap().is_active);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_every_email_attempt_is_logged() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("pg_delivery_log");
    let (tenant, user) = (data.tenant_id(), data.user_id(9));
    db.seed_user(tenant, user, "Dana", "accountant", None).await;
    let svc = service(&db);

    svc.create_provider(tenant, provider("SMTP", true)).await.unwrap();
    svc.update_preference(
        tenant,
        user,
        "INVOICE_CREATED",
        UpdatePreference {
            in_app_enabled: true,
            email_enabled: true,
            digest_frequency: Default::default(),
            quiet_hours: false,
            quiet_start: None,
            quiet_end: None,
        },
    )
    .await
    .unwrap();

    let created = svc
        .create_notification(tenant, data.user_id(1), notification(user, "INVOICE_CREATED"))
        .await
        .unwrap();
    assert_eq!(created.len(), 1);

    // No adapters are registered, so the attempt fails but is still recorded.
    let logs = svc.email_logs(tenant, EmailLogQuery::default()).await.unwrap();
    assert_eq!(logs.total, 1);
    assert_eq!(logs.items[0].status, DeliveryStatus::Failed);
    assert_eq!(logs.items[0].notification_id, Some(created[0].id));
    assert_eq!(logs.items[0].recipient_email, format!("user{user}@example.test"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_all_users_trigger_renders_title_for_each_user() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("pg_trigger");
    let tenant = data.tenant_id();
    db.seed_user(tenant, data.user_id(1), "Ada", "admin", Some("ops")).await;
    db.seed_user(tenant, data.user_id(2), "Lin", "accountant", Some("finance")).await;
    let svc = service(&db);

    let trigger: CreateTrigger = serde_json::from_value(json!({
        "triggerName": "Overdue",
        "triggerModule": "tasks",
        "triggerEvent": "overdue",
        "notificationType": "TASK_OVERDUE",
        "titleTemplate": "{{taskName}} is overdue",
        "messageTemplate": "Please review",
        "recipientType": "all_users"
    }))
    .unwrap();
    svc.create_trigger(tenant, data.user_id(1), trigger).await.unwrap();

    let outcome = svc
        .handle_event(
            tenant,
            TriggerEvent {
                module: "tasks".into(),
                event: "overdue".into(),
                payload: json!({ "taskName": "Audit" }),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.notifications, 2);

    for n in [1, 2] {
        let page = svc
            .list_notifications(tenant, data.user_id(n), ListNotificationsQuery::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].title, "Audit is overdue");
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_scheduled_dispatch_is_claimed_once_and_never_early() {
    let db = TestDatabase::new().await;
    let data = TestDataBuilder::from_test_name("pg_scheduled");
    let tenant = data.tenant_id();
    let repos = Repositories::postgres(db.connection());
    let now = Utc::now();

    let due = repos
        .scheduled
        .enqueue(
            tenant,
            None,
            DispatchRequest::new(tenant, vec![data.user_id(1)], "SYSTEM", "due", "b"),
            now - Duration::minutes(1),
        )
        .await
        .unwrap();
    repos
        .scheduled
        .enqueue(
            tenant,
            None,
            DispatchRequest::new(tenant, vec![data.user_id(2)], "SYSTEM", "later", "b"),
            now + Duration::minutes(30),
        )
        .await
        .unwrap();

    let claimed = repos
        .scheduled
        .claim_due(now, Duration::minutes(5), 10)
        .await
        .unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].id, due.id);
    assert_eq!(claimed[0].attempts, 1);

    let again = repos
        .scheduled
        .claim_due(now, Duration::minutes(5), 10)
        .await
        .unwrap();
    assert!(again.is_empty());

    repos.scheduled.complete(due.id).await.unwrap();
    let after_lease = repos
        .scheduled
        .claim_due(now + Duration::minutes(10), Duration::minutes(5), 10)
        .await
        .unwrap();
    assert!(after_lease.is_empty());
}
