//! Notifications Domain
//!
//! Multi-tenant notification dispatch: in-app rows plus optional email through
//! each tenant's own provider.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌─────────────────┐
//! │  HTTP handlers  │   │ Producer events │
//! └────────┬────────┘   └────────┬────────┘
//!          │            ┌────────▼────────┐    ┌──────────────────┐
//!          │            │  TriggerEngine  │───►│ scheduled queue  │
//!          │            └────────┬────────┘    └────────┬─────────┘
//!          │                     │             DelayedDispatchWorker
//! ┌────────▼─────────────────────▼────────────────────▼─┐
//! │ DispatchEngine  (PreferenceResolver → batch insert) │
//! └────────────────────────┬────────────────────────────┘
//!                 ┌────────▼────────┐
//!                 │  ChannelRouter  │  ← active provider, timeout, delivery log
//!                 └────────┬────────┘
//!                 ┌────────▼────────┐
//!                 │ ProviderRegistry│  ← SendGrid, SMTP, Mailgun, SES, Postmark, Resend
//!                 └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{NotificationService, NotificationsConfig, Repositories, handlers};
//!
//! let service = NotificationService::new(Repositories::postgres(db), NotificationsConfig::from_env()?)?;
//! tokio::spawn({
//!     let worker = service.worker();
//!     let shutdown = coordinator.subscribe();
//!     async move { worker.run(shutdown).await }
//! });
//! let routes = handlers::router(Arc::new(service), JwtAuth::new(&jwt_config));
//! ```

pub mod analytics;
pub mod conditions;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod preferences;
pub mod providers;
pub mod recipients;
pub mod repository;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod templates;
pub mod trigger_engine;

#[cfg(test)]
pub(crate) mod testing;

pub use config::NotificationsConfig;
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use dispatch::DispatchEngine;
pub use error::{NotificationError, NotificationResult};
pub use handlers::ApiDoc;
pub use models::{
    DirectoryUser, DispatchRequest, EventOutcome, Notification, TenantId, TriggerEvent, UserId,
};
pub use providers::{EmailAdapter, ProviderRegistry};
pub use repository::Repositories;
pub use scheduler::DelayedDispatchWorker;
pub use service::NotificationService;
pub use trigger_engine::TriggerEngine;
