//! Domain types shared by the engines, repositories and HTTP handlers.
//!
//! API payloads are camelCase JSON; enums serialize with the same spelling the
//! database stores.

mod delivery_log;
mod directory;
mod dispatch;
mod notification;
mod preference;
mod provider;
mod trigger;

pub use delivery_log::*;
pub use directory::*;
pub use dispatch::*;
pub use notification::*;
pub use preference::*;
pub use provider::*;
pub use trigger::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tenant identifier owned by the host application.
pub type TenantId = i64;

/// User identifier owned by the host application.
pub type UserId = i64;

pub(crate) fn default_page() -> u64 {
    1
}

pub(crate) fn default_limit() -> u64 {
    20
}

/// One page of a listing plus the unpaged total.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
        }
    }
}

/// Row offset for a 1-based page.
pub(crate) fn offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}
