use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_helpers::{AppError, TenantClaims, ValidatedJson};
use std::sync::Arc;

use crate::models::{EffectivePreference, UpdatePreference};
use crate::service::NotificationService;

/// The caller's effective preference for every known type
#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    responses(
        (status = 200, description = "Stored values with defaults filled in", body = Vec<EffectivePreference>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_preferences(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    let preferences = service.preferences(claims.tenant_id, claims.user_id()).await?;
    Ok(Json(preferences))
}

#[utoipa::path(
    put,
    path = "/preferences/{type}",
    tag = "preferences",
    params(
        ("type" = String, Path, description = "Notification type, e.g. INVOICE_CREATED")
    ),
    request_body = UpdatePreference,
    responses(
        (status = 200, description = "Stored preference", body = EffectivePreference),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_preference(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    Path(notification_type): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdatePreference>,
) -> Result<impl IntoResponse, AppError> {
    let preference = service
        .update_preference(claims.tenant_id, claims.user_id(), &notification_type, input)
        .await?;
    Ok(Json(preference))
}
