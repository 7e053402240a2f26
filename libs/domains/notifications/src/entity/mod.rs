//! sea-orm entities, one module per table.

pub mod delivery_log;
pub mod notification;
pub mod preference;
pub mod provider_setting;
pub mod scheduled_dispatch;
pub mod tenant_user;
pub mod trigger;
