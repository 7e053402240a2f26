use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{AppError, TenantClaims, ValidatedJson};
use std::sync::Arc;

use crate::models::{EventOutcome, MentionRequest, Notification, TriggerEvent};
use crate::service::NotificationService;

/// Run the tenant's active triggers for a producer event
///
/// Individual trigger failures are counted in the outcome, never returned.
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    request_body = TriggerEvent,
    responses(
        (status = 202, description = "Event processed", body = EventOutcome),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn publish_event(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(event): ValidatedJson<TriggerEvent>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let outcome = service.handle_event(claims.tenant_id, event).await?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

/// Notify every `@name` mentioned in the text, except the caller
#[utoipa::path(
    post,
    path = "/mentions",
    tag = "events",
    request_body = MentionRequest,
    responses(
        (status = 201, description = "Mention notifications created", body = Vec<Notification>),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn mention(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(input): ValidatedJson<MentionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = service
        .mention(claims.tenant_id, claims.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
