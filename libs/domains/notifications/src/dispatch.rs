//! The single write path for notifications.
//!
//! A dispatch dedupes its recipients, asks the [`PreferenceResolver`] who may
//! receive it on which channel, inserts one row per eligible user in a single
//! batch and only then hands the email subset to the [`ChannelRouter`]. Email
//! problems are logged and never undo or fail the dispatch.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, instrument, warn};

use crate::directory::UserDirectory;
use crate::error::NotificationResult;
use crate::models::{
    Channel, DispatchRequest, Eligibility, MENTION_TYPE, MentionRequest, NewNotification,
    Notification, TenantId, UserId,
};
use crate::preferences::PreferenceResolver;
use crate::recipients::dedupe;
use crate::repository::{NotificationRepository, Repositories};
use crate::router::{ChannelRouter, EmailDelivery};
use crate::templates::EmailLayout;

// `@` must open a word, so addresses like `dana@ops.test` are not mentions.
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w.])@(\w+)").unwrap());

const MENTION_TITLE: &str = "You were mentioned";

/// `@word` tokens in `text`, first-seen order, case-insensitively unique.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in MENTION.captures_iter(text) {
        let name = &capture[1];
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    names
}

#[derive(Clone)]
pub struct DispatchEngine {
    notifications: Arc<dyn NotificationRepository>,
    directory: Arc<dyn UserDirectory>,
    preferences: PreferenceResolver,
    router: ChannelRouter,
    layout: EmailLayout,
    app_name: String,
}

impl DispatchEngine {
    pub fn new(
        repos: &Repositories,
        router: ChannelRouter,
        layout: EmailLayout,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            notifications: repos.notifications.clone(),
            directory: repos.directory.clone(),
            preferences: PreferenceResolver::new(repos.preferences.clone()),
            router,
            layout,
            app_name: app_name.into(),
        }
    }

    /// Persists one notification per eligible recipient and emails the
    /// email-eligible ones. Only a failed insert is returned as an error.
    #[instrument(
        skip(self, request),
        fields(
            tenant_id = request.tenant_id,
            notification_type = %request.notification_type,
            batch = request.batch_delivery
        )
    )]
    pub async fn dispatch(&self, request: DispatchRequest) -> NotificationResult<Vec<Notification>> {
        let tenant_id = request.tenant_id;
        let recipients = dedupe(request.recipients.iter().copied());
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let eligible = self
            .preferences
            .eligible(tenant_id, &recipients, &request.notification_type)
            .await;
        let channels = &request.delivery_channels;
        let eligible = Eligibility {
            in_app: if channels.contains(Channel::InApp) {
                eligible.in_app
            } else {
                Vec::new()
            },
            email: if channels.contains(Channel::Email) {
                eligible.email
            } else {
                Vec::new()
            },
        };
        if eligible.is_empty() {
            debug!(candidates = recipients.len(), "No eligible recipients");
            return Ok(Vec::new());
        }

        let rows: Vec<NewNotification> = recipients
            .iter()
            .filter(|id| eligible.in_app.contains(id) || eligible.email.contains(id))
            .map(|&user_id| NewNotification {
                tenant_id,
                user_id,
                title: request.title.clone(),
                message_body: request.message_body.clone(),
                link_url: request.link_url.clone(),
                notification_type: request.notification_type.clone(),
                severity: request.severity,
                created_by: request.created_by,
                related_module: request.related_module.clone(),
                related_entity_id: request.related_entity_id.clone(),
                template_variables: request.template_variables.clone(),
            })
            .collect();

        let created = self.notifications.insert_batch(rows).await?;

        info!(
            created = created.len(),
            email_candidates = eligible.email.len(),
            "Notifications dispatched"
        );

        if !eligible.email.is_empty() {
            self.send_emails(&request, &eligible.email, &created).await;
        }

        Ok(created)
    }

    async fn send_emails(&self, request: &DispatchRequest, users: &[UserId], created: &[Notification]) {
        let tenant_id = request.tenant_id;
        let contacts = match self.directory.contacts(tenant_id, users).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!(error = %e, "Failed to load recipient contacts, skipping email channel");
                return;
            }
        };

        let email = match self.layout.render(
            &self.app_name,
            &request.title,
            &request.message_body,
            request.link_url.as_deref(),
        ) {
            Ok(email) => email,
            Err(e) => {
                warn!(error = %e, "Failed to render notification email, skipping email channel");
                return;
            }
        };

        let by_user: HashMap<UserId, uuid::Uuid> =
            created.iter().map(|n| (n.user_id, n.id)).collect();
        let deliveries: Vec<EmailDelivery> = contacts
            .into_iter()
            .filter_map(|user| {
                let to = user.email.filter(|e| !e.trim().is_empty())?;
                Some(EmailDelivery {
                    to,
                    notification_id: by_user.get(&user.id).copied(),
                    email: email.clone(),
                })
            })
            .collect();

        if deliveries.len() < users.len() {
            debug!(
                missing = users.len() - deliveries.len(),
                "Some email recipients have no address"
            );
        }

        self.router.deliver(tenant_id, deliveries).await;
    }

    /// Notifies every user named by an `@name` token in `input.text`, except
    /// the author.
    #[instrument(skip(self, input))]
    pub async fn mention(
        &self,
        tenant_id: TenantId,
        author: UserId,
        input: MentionRequest,
    ) -> NotificationResult<Vec<Notification>> {
        let names = extract_mentions(&input.text);
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.directory.find_by_display_names(tenant_id, &names).await?;
        let recipients: Vec<UserId> = users
            .into_iter()
            .map(|u| u.id)
            .filter(|id| *id != author)
            .collect();
        debug!(names = names.len(), recipients = recipients.len(), "Resolved mentions");

        let mut request = DispatchRequest::new(
            tenant_id,
            recipients,
            MENTION_TYPE,
            input.title.unwrap_or_else(|| MENTION_TITLE.to_string()),
            input.text,
        )
        .with_link(input.link_url)
        .with_creator(Some(author));
        request.related_module = input.related_module;
        request.related_entity_id = input.related_entity_id;

        self.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::models::{
        ChannelSet, DeliveryStatus, DirectoryUser, EmailLogQuery, EmailProviderKind,
        ListNotificationsQuery,
    };
    use crate::error::NotificationError;
    use crate::providers::{MockEmailAdapter, ProviderRegistry};
    use crate::repository::MockNotificationRepository;
    use crate::testing::{
        activate_provider, dispatch_engine, email_on, rejecting_registry, stub_registry,
    };

    async fn directory() -> InMemoryUserDirectory {
        let directory = InMemoryUserDirectory::new();
        directory
            .insert(DirectoryUser::new(5, 9, "Dana", "accountant").with_email("dana@acme.test"))
            .await;
        directory
            .insert(DirectoryUser::new(5, 10, "Lee", "manager").with_email("lee@acme.test"))
            .await;
        directory
            .insert(DirectoryUser::new(5, 11, "Kim", "accountant"))
            .await;
        directory
    }

    async fn unread(repos: &Repositories, user: UserId) -> Vec<Notification> {
        repos
            .notifications
            .list_for_user(5, user, &ListNotificationsQuery::default())
            .await
            .unwrap()
            .0
    }

    async fn logs(repos: &Repositories) -> usize {
        repos
            .delivery_logs
            .list(5, &EmailLogQuery::default())
            .await
            .unwrap()
            .1 as usize
    }

    #[test]
    fn extracts_unique_mentions() {
        assert_eq!(
            extract_mentions("@Dana please ask @lee and @dana, not email@"),
            vec!["Dana", "lee"]
        );
        assert!(extract_mentions("no mentions here").is_empty());
    }

    #[test]
    fn email_addresses_are_not_mentions() {
        assert!(extract_mentions("mail dana@ops.test or lee@acme.test").is_empty());
        assert_eq!(
            extract_mentions("cc (@Kim), reply to kim@acme.test\n@lee"),
            vec!["Kim", "lee"]
        );
    }

    #[tokio::test]
    async fn defaults_create_in_app_row_without_email() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        activate_provider(&repos, 5, EmailProviderKind::Smtp).await;
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let created = engine
            .dispatch(DispatchRequest::new(5, vec![9], "TASK_ASSIGNMENT", "Review", "Please review"))
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert!(!created[0].is_read);
        assert_eq!(unread(&repos, 9).await.len(), 1);
        assert_eq!(logs(&repos).await, 0);
    }

    #[tokio::test]
    async fn email_enabled_user_gets_one_delivery_log() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        activate_provider(&repos, 5, EmailProviderKind::Smtp).await;
        email_on(&repos, 5, 9, "INVOICE_CREATED").await;
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let created = engine
            .dispatch(DispatchRequest::new(5, vec![9], "INVOICE_CREATED", "Invoice", "INV-7"))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);

        let (rows, total) = repos
            .delivery_logs
            .list(5, &EmailLogQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].status, DeliveryStatus::Sent);
        assert_eq!(rows[0].recipient_email, "dana@acme.test");
        assert_eq!(rows[0].notification_id, Some(created[0].id));
    }

    #[tokio::test]
    async fn rejected_email_keeps_the_row_and_logs_failure() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        activate_provider(&repos, 5, EmailProviderKind::Smtp).await;
        email_on(&repos, 5, 9, "INVOICE_CREATED").await;
        let engine = dispatch_engine(&repos, rejecting_registry(EmailProviderKind::Smtp));

        let created = engine
            .dispatch(DispatchRequest::new(5, vec![9], "INVOICE_CREATED", "Invoice", "INV-7"))
            .await
            .unwrap();
        assert_eq!(created.len(), 1);

        let stored = unread(&repos, 9).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, created[0].id);

        let (rows, total) = repos
            .delivery_logs
            .list(5, &EmailLogQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].status, DeliveryStatus::Failed);
        assert_eq!(rows[0].notification_id, Some(created[0].id));
        assert!(
            rows[0]
                .error_message
                .as_deref()
                .is_some_and(|m| m.contains("mailbox unavailable"))
        );
    }

    #[tokio::test]
    async fn failed_insert_is_returned_and_nothing_is_sent() {
        let mut repos = Repositories::in_memory_with_directory(directory().await);
        activate_provider(&repos, 5, EmailProviderKind::Smtp).await;
        email_on(&repos, 5, 9, "INVOICE_CREATED").await;

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert_batch()
            .times(1)
            .returning(|_| Err(NotificationError::Database("connection reset".into())));
        repos.notifications = Arc::new(notifications);

        let mut adapter = MockEmailAdapter::new();
        adapter.expect_kind().return_const(EmailProviderKind::Smtp);
        adapter.expect_send().never();
        let engine = dispatch_engine(
            &repos,
            ProviderRegistry::empty().with_adapter(Arc::new(adapter)),
        );

        let err = engine
            .dispatch(DispatchRequest::new(5, vec![9], "INVOICE_CREATED", "Invoice", "INV-7"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Database(ref m) if m == "connection reset"));
        assert_eq!(logs(&repos).await, 0);
    }

    #[tokio::test]
    async fn in_app_only_channels_suppress_email() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        activate_provider(&repos, 5, EmailProviderKind::Smtp).await;
        email_on(&repos, 5, 9, "INVOICE_CREATED").await;
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let request = DispatchRequest::new(5, vec![9], "INVOICE_CREATED", "Invoice", "INV-7")
            .with_channels(ChannelSet::in_app_only());
        assert_eq!(engine.dispatch(request).await.unwrap().len(), 1);
        assert_eq!(logs(&repos).await, 0);
    }

    #[tokio::test]
    async fn nobody_eligible_writes_nothing() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        repos
            .preferences
            .upsert(5, 9, "SYSTEM", crate::testing::preference(false, false))
            .await
            .unwrap();
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let created = engine
            .dispatch(DispatchRequest::new(5, vec![9, 9], "SYSTEM", "t", "b"))
            .await
            .unwrap();
        assert!(created.is_empty());
        assert!(unread(&repos, 9).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_recipients_get_one_row_each() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let created = engine
            .dispatch(DispatchRequest::new(5, vec![10, 9, 10, 9], "SYSTEM", "t", "b"))
            .await
            .unwrap();
        let users: Vec<UserId> = created.iter().map(|n| n.user_id).collect();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&9) && users.contains(&10));
    }

    #[tokio::test]
    async fn mentions_skip_the_author() {
        let repos = Repositories::in_memory_with_directory(directory().await);
        let engine = dispatch_engine(&repos, stub_registry(EmailProviderKind::Smtp));

        let input = MentionRequest {
            text: "@dana and @LEE see this".into(),
            title: None,
            link_url: None,
            related_module: Some("invoices".into()),
            related_entity_id: Some("INV-7".into()),
        };
        let created = engine.mention(5, 10, input).await.unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].user_id, 9);
        assert_eq!(created[0].notification_type, MENTION_TYPE);
        assert_eq!(created[0].title, MENTION_TITLE);
        assert_eq!(created[0].created_by, Some(10));
        assert_eq!(created[0].related_entity_id.as_deref(), Some("INV-7"));
    }
}
