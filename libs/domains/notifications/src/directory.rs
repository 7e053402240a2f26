//! Read-only view of the host application's users.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::NotificationResult;
use crate::models::{DirectoryUser, TenantId, UserId};

/// Lookups the recipient resolver and mention parser need. Every method sees
/// active users of one tenant only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn all_users(&self, tenant_id: TenantId) -> NotificationResult<Vec<UserId>>;

    async fn users_with_roles(
        &self,
        tenant_id: TenantId,
        roles: &[String],
    ) -> NotificationResult<Vec<UserId>>;

    async fn users_in_departments(
        &self,
        tenant_id: TenantId,
        departments: &[String],
    ) -> NotificationResult<Vec<UserId>>;

    /// Case-insensitive exact match on display name.
    async fn find_by_display_names(
        &self,
        tenant_id: TenantId,
        names: &[String],
    ) -> NotificationResult<Vec<DirectoryUser>>;

    /// Users among `user_ids`, with their email addresses.
    async fn contacts(
        &self,
        tenant_id: TenantId,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<DirectoryUser>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<BTreeMap<(TenantId, UserId), DirectoryUser>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: DirectoryUser) {
        self.users
            .write()
            .await
            .insert((user.tenant_id, user.id), user);
    }

    async fn active_where<F>(&self, tenant_id: TenantId, keep: F) -> Vec<DirectoryUser>
    where
        F: Fn(&DirectoryUser) -> bool,
    {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.tenant_id == tenant_id && u.is_active && keep(u))
            .cloned()
            .collect()
    }
}

fn ids(users: Vec<DirectoryUser>) -> Vec<UserId> {
    users.into_iter().map(|u| u.id).collect()
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn all_users(&self, tenant_id: TenantId) -> NotificationResult<Vec<UserId>> {
        Ok(ids(self.active_where(tenant_id, |_| true).await))
    }

    async fn users_with_roles(
        &self,
        tenant_id: TenantId,
        roles: &[String],
    ) -> NotificationResult<Vec<UserId>> {
        Ok(ids(self
            .active_where(tenant_id, |u| roles.contains(&u.role))
            .await))
    }

    async fn users_in_departments(
        &self,
        tenant_id: TenantId,
        departments: &[String],
    ) -> NotificationResult<Vec<UserId>> {
        Ok(ids(self
            .active_where(tenant_id, |u| {
                u.department.as_ref().is_some_and(|d| departments.contains(d))
            })
            .await))
    }

    async fn find_by_display_names(
        &self,
        tenant_id: TenantId,
        names: &[String],
    ) -> NotificationResult<Vec<DirectoryUser>> {
        let wanted: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        Ok(self
            .active_where(tenant_id, |u| wanted.contains(&u.display_name.to_lowercase()))
            .await)
    }

    async fn contacts(
        &self,
        tenant_id: TenantId,
        user_ids: &[UserId],
    ) -> NotificationResult<Vec<DirectoryUser>> {
        Ok(self
            .active_where(tenant_id, |u| user_ids.contains(&u.id))
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryUserDirectory {
        let directory = InMemoryUserDirectory::new();
        directory
            .insert(DirectoryUser::new(5, 1, "Alice", "admin").with_department("finance"))
            .await;
        directory
            .insert(DirectoryUser::new(5, 2, "Bob", "accountant").with_department("finance"))
            .await;
        directory
            .insert(DirectoryUser::new(5, 3, "Carol", "accountant").inactive())
            .await;
        directory.insert(DirectoryUser::new(6, 4, "Dave", "admin")).await;
        directory
    }

    #[tokio::test]
    async fn lookups_skip_inactive_and_foreign_users() {
        let directory = seeded().await;
        assert_eq!(directory.all_users(5).await.unwrap(), vec![1, 2]);
        assert_eq!(
            directory
                .users_with_roles(5, &["accountant".to_string()])
                .await
                .unwrap(),
            vec![2]
        );
        assert_eq!(
            directory
                .users_in_departments(5, &["finance".to_string()])
                .await
                .unwrap(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn display_names_match_case_insensitively() {
        let directory = seeded().await;
        let found = directory
            .find_by_display_names(5, &["alice".to_string(), "dave".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }
}
