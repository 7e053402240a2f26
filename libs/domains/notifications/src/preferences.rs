//! Per-user channel eligibility. Every read path goes through here so the
//! defaults live in one place.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::error::NotificationResult;
use crate::models::{
    EffectivePreference, Eligibility, KNOWN_NOTIFICATION_TYPES, NotificationPreference, TenantId,
    UpdatePreference, UserId,
};
use crate::repository::PreferenceRepository;

#[derive(Clone)]
pub struct PreferenceResolver {
    repository: Arc<dyn PreferenceRepository>,
}

impl PreferenceResolver {
    pub fn new(repository: Arc<dyn PreferenceRepository>) -> Self {
        Self { repository }
    }

    /// Splits `candidates` by channel. Users without a stored row get the
    /// defaults (in-app on, email off). A failed lookup is treated as "no rows".
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn eligible(
        &self,
        tenant_id: TenantId,
        candidates: &[UserId],
        notification_type: &str,
    ) -> Eligibility {
        let stored = match self
            .repository
            .find_for_users(tenant_id, notification_type, candidates)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Preference lookup failed, using defaults");
                Vec::new()
            }
        };
        let by_user: HashMap<UserId, NotificationPreference> =
            stored.into_iter().map(|p| (p.user_id, p)).collect();

        let mut eligibility = Eligibility::default();
        for user_id in candidates {
            let preference = by_user
                .get(user_id)
                .cloned()
                .map(EffectivePreference::from)
                .unwrap_or_else(|| EffectivePreference::defaults(notification_type));
            if preference.in_app_enabled {
                eligibility.in_app.push(*user_id);
            }
            if preference.email_enabled {
                eligibility.email.push(*user_id);
            }
        }
        eligibility
    }

    /// Effective preferences for every known type plus any type the user has a row for.
    pub async fn effective_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> NotificationResult<Vec<EffectivePreference>> {
        let mut effective: BTreeMap<String, EffectivePreference> = KNOWN_NOTIFICATION_TYPES
            .iter()
            .map(|t| (t.to_string(), EffectivePreference::defaults(t)))
            .collect();

        for row in self.repository.list_for_user(tenant_id, user_id).await? {
            effective.insert(row.notification_type.clone(), row.into());
        }
        Ok(effective.into_values().collect())
    }

    pub async fn update(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        notification_type: &str,
        input: UpdatePreference,
    ) -> NotificationResult<EffectivePreference> {
        let row = self
            .repository
            .upsert(tenant_id, user_id, notification_type, input)
            .await?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use crate::models::DigestFrequency;
    use crate::repository::{InMemoryPreferenceRepository, MockPreferenceRepository};

    fn prefs(in_app: bool, email: bool) -> UpdatePreference {
        UpdatePreference {
            in_app_enabled: in_app,
            email_enabled: email,
            digest_frequency: DigestFrequency::Immediate,
            quiet_hours: false,
            quiet_start: None,
            quiet_end: None,
        }
    }

    #[tokio::test]
    async fn users_without_rows_get_in_app_only() {
        let resolver = PreferenceResolver::new(Arc::new(InMemoryPreferenceRepository::new()));
        let eligibility = resolver.eligible(5, &[9], "TASK_ASSIGNMENT").await;
        assert_eq!(eligibility.in_app, vec![9]);
        assert!(eligibility.email.is_empty());
    }

    #[tokio::test]
    async fn stored_rows_are_used_verbatim() {
        let repo = Arc::new(InMemoryPreferenceRepository::new());
        repo.upsert(5, 9, "INVOICE_CREATED", prefs(false, true)).await.unwrap();
        repo.upsert(5, 10, "INVOICE_CREATED", prefs(false, false)).await.unwrap();
        repo.upsert(5, 11, "SYSTEM", prefs(false, false)).await.unwrap();

        let resolver = PreferenceResolver::new(repo);
        let eligibility = resolver.eligible(5, &[9, 10, 11], "INVOICE_CREATED").await;
        assert_eq!(eligibility.in_app, vec![11]);
        assert_eq!(eligibility.email, vec![9]);
    }

    #[tokio::test]
    async fn lookup_failure_fails_open() {
        let mut repo = MockPreferenceRepository::new();
        repo.expect_find_for_users()
            .returning(|_, _, _| Err(NotificationError::Database("connection reset".into())));

        let resolver = PreferenceResolver::new(Arc::new(repo));
        let eligibility = resolver.eligible(5, &[9, 10], "SYSTEM").await;
        assert_eq!(eligibility.in_app, vec![9, 10]);
        assert!(eligibility.email.is_empty());
    }

    #[tokio::test]
    async fn effective_view_fills_defaults_and_keeps_custom_types() {
        let repo = Arc::new(InMemoryPreferenceRepository::new());
        repo.upsert(5, 9, "MENTION", prefs(true, true)).await.unwrap();
        repo.upsert(5, 9, "CUSTOM_EVENT", prefs(false, true)).await.unwrap();

        let resolver = PreferenceResolver::new(repo);
        let effective = resolver.effective_for_user(5, 9).await.unwrap();
        assert_eq!(effective.len(), KNOWN_NOTIFICATION_TYPES.len() + 1);

        let mention = effective.iter().find(|p| p.notification_type == "MENTION").unwrap();
        assert!(mention.email_enabled && !mention.is_default);
        let system = effective.iter().find(|p| p.notification_type == "SYSTEM").unwrap();
        assert!(system.in_app_enabled && !system.email_enabled && system.is_default);
        assert!(effective.iter().any(|p| p.notification_type == "CUSTOM_EVENT"));
    }
}
