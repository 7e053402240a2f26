use serde::{Deserialize, Serialize};

use super::{TenantId, UserId};

/// A user as seen through the host application's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: Option<String>,
    pub display_name: String,
    pub role: String,
    pub department: Option<String>,
    pub is_active: bool,
}

impl DirectoryUser {
    pub fn new(tenant_id: TenantId, id: UserId, display_name: &str, role: &str) -> Self {
        Self {
            id,
            tenant_id,
            email: None,
            display_name: display_name.to_string(),
            role: role.to_string(),
            department: None,
            is_active: true,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
