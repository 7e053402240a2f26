//! HTTP surface, mounted by the binary under `/api/notifications`.
//!
//! Every route requires a bearer token; the tenant and user come from its
//! claims, never from the request body. Provider, trigger, log and event
//! routes additionally require an admin role.

mod analytics;
mod events;
mod notifications;
mod preferences;
mod providers;
mod triggers;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use axum_helpers::{JwtAuth, jwt_auth_middleware};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    AnalyticsReport, BulkMarkRead, Channel, ChannelSet, CreateEmailProvider, CreateNotification,
    CreateTrigger, DeliveryOutcome, DeliveryStats, DeliveryStatus, DigestFrequency,
    EffectivePreference, EmailDeliveryLog, EmailProviderKind, EmailProviderView, EventOutcome,
    MarkedRead, MentionRequest, Notification, NotificationStats, NotificationTrigger,
    RecipientType, Severity, TestEmailRequest, TriggerEvent, UnreadCount, UpdateEmailProvider,
    UpdatePreference, UpdateTrigger,
};
use crate::service::NotificationService;

#[derive(OpenApi)]
#[openapi(
    paths(
        notifications::list_notifications,
        notifications::create_notification,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::bulk_mark_read,
        providers::list_providers,
        providers::get_provider,
        providers::create_provider,
        providers::update_provider,
        providers::delete_provider,
        providers::test_provider,
        triggers::list_triggers,
        triggers::get_trigger,
        triggers::create_trigger,
        triggers::update_trigger,
        triggers::delete_trigger,
        preferences::list_preferences,
        preferences::update_preference,
        events::publish_event,
        events::mention,
        analytics::analytics,
        analytics::clear_cache,
        analytics::email_logs,
    ),
    components(
        schemas(
            Notification, CreateNotification, UnreadCount, MarkedRead, BulkMarkRead,
            Severity, Channel, ChannelSet,
            EmailProviderKind, EmailProviderView, CreateEmailProvider, UpdateEmailProvider,
            TestEmailRequest, DeliveryOutcome,
            NotificationTrigger, CreateTrigger, UpdateTrigger, RecipientType,
            EffectivePreference, UpdatePreference, DigestFrequency,
            TriggerEvent, EventOutcome, MentionRequest,
            EmailDeliveryLog, DeliveryStatus, DeliveryStats, NotificationStats, AnalyticsReport,
        )
    ),
    tags(
        (name = "notifications", description = "In-app notifications for the calling user"),
        (name = "email-providers", description = "Tenant email provider settings (admin)"),
        (name = "triggers", description = "Event-driven notification rules (admin)"),
        (name = "preferences", description = "Per-type channel preferences of the calling user"),
        (name = "events", description = "Producer entry points"),
        (name = "analytics", description = "Delivery logs and aggregates")
    )
)]
pub struct ApiDoc;

/// All notification routes behind JWT authentication.
pub fn router(service: Arc<NotificationService>, auth: JwtAuth) -> Router {
    Router::new()
        .route(
            "/",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/unread-count", get(notifications::unread_count))
        .route("/{id}/read", put(notifications::mark_read))
        .route("/mark-all-read", put(notifications::mark_all_read))
        .route("/bulk-mark-read", post(notifications::bulk_mark_read))
        .route(
            "/email-providers",
            get(providers::list_providers).post(providers::create_provider),
        )
        .route(
            "/email-providers/{id}",
            get(providers::get_provider)
                .put(providers::update_provider)
                .delete(providers::delete_provider),
        )
        .route("/email-providers/{id}/test", post(providers::test_provider))
        .route(
            "/triggers",
            get(triggers::list_triggers).post(triggers::create_trigger),
        )
        .route(
            "/triggers/{id}",
            get(triggers::get_trigger)
                .put(triggers::update_trigger)
                .delete(triggers::delete_trigger),
        )
        .route("/preferences", get(preferences::list_preferences))
        .route("/preferences/{type}", put(preferences::update_preference))
        .route("/events", post(events::publish_event))
        .route("/mentions", post(events::mention))
        .route("/analytics", get(analytics::analytics))
        .route("/clear-cache", post(analytics::clear_cache))
        .route("/email-logs", get(analytics::email_logs))
        .with_state(service)
        .layer(middleware::from_fn_with_state(auth, jwt_auth_middleware))
}
