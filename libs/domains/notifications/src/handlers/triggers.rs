use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{AppError, TenantClaims, UuidPath, ValidatedJson};
use std::sync::Arc;

use crate::models::{CreateTrigger, NotificationTrigger, UpdateTrigger};
use crate::service::NotificationService;

#[utoipa::path(
    get,
    path = "/triggers",
    tag = "triggers",
    responses(
        (status = 200, description = "The tenant's triggers", body = Vec<NotificationTrigger>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_triggers(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let triggers = service.list_triggers(claims.tenant_id).await?;
    Ok(Json(triggers))
}

#[utoipa::path(
    get,
    path = "/triggers/{id}",
    tag = "triggers",
    params(
        ("id" = String, Path, description = "Trigger ID")
    ),
    responses(
        (status = 200, description = "Trigger found", body = NotificationTrigger),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Trigger not found")
    )
)]
pub async fn get_trigger(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let trigger = service.get_trigger(claims.tenant_id, id).await?;
    Ok(Json(trigger))
}

/// Create a trigger. Recipient config and conditions are checked up front.
#[utoipa::path(
    post,
    path = "/triggers",
    tag = "triggers",
    request_body = CreateTrigger,
    responses(
        (status = 201, description = "Trigger created", body = NotificationTrigger),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_trigger(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(input): ValidatedJson<CreateTrigger>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let trigger = service
        .create_trigger(claims.tenant_id, claims.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(trigger)))
}

#[utoipa::path(
    put,
    path = "/triggers/{id}",
    tag = "triggers",
    params(
        ("id" = String, Path, description = "Trigger ID")
    ),
    request_body = UpdateTrigger,
    responses(
        (status = 200, description = "Trigger updated", body = NotificationTrigger),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Trigger not found")
    )
)]
pub async fn update_trigger(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateTrigger>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let trigger = service.update_trigger(claims.tenant_id, id, input).await?;
    Ok(Json(trigger))
}

#[utoipa::path(
    delete,
    path = "/triggers/{id}",
    tag = "triggers",
    params(
        ("id" = String, Path, description = "Trigger ID")
    ),
    responses(
        (status = 204, description = "Trigger deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Trigger not found")
    )
)]
pub async fn delete_trigger(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    service.delete_trigger(claims.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
