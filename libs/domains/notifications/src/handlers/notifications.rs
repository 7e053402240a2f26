use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_helpers::{AppError, TenantClaims, UuidPath, ValidatedJson};
use std::sync::Arc;

use crate::models::{
    BulkMarkRead, CreateNotification, ListNotificationsQuery, MarkedRead, Notification,
    Page, UnreadCount,
};
use crate::service::NotificationService;

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "",
    tag = "notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "One page of notifications", body = Page<Notification>),
        (status = 400, description = "Invalid paging parameters"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_notifications(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = service
        .list_notifications(claims.tenant_id, claims.user_id(), query)
        .await?;
    Ok(Json(page))
}

/// Create notifications for a set of users
///
/// Recipients' preferences decide which channels each one gets.
#[utoipa::path(
    post,
    path = "",
    tag = "notifications",
    request_body = CreateNotification,
    responses(
        (status = 201, description = "Rows created for eligible recipients", body = Vec<Notification>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Rows could not be stored")
    )
)]
pub async fn create_notification(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(input): ValidatedJson<CreateNotification>,
) -> Result<impl IntoResponse, AppError> {
    let created = service
        .create_notification(claims.tenant_id, claims.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread notifications of the caller", body = UnreadCount),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn unread_count(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    let count = service.unread_count(claims.tenant_id, claims.user_id()).await?;
    Ok(Json(count))
}

/// Mark one of the caller's notifications read
#[utoipa::path(
    put,
    path = "/{id}/read",
    tag = "notifications",
    params(
        ("id" = String, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Marked read"),
        (status = 400, description = "Invalid notification ID"),
        (status = 404, description = "No such notification for the caller")
    )
)]
pub async fn mark_read(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    service.mark_read(claims.tenant_id, claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/mark-all-read",
    tag = "notifications",
    responses(
        (status = 200, description = "Number of rows that changed", body = MarkedRead),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn mark_all_read(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    let marked = service.mark_all_read(claims.tenant_id, claims.user_id()).await?;
    Ok(Json(marked))
}

/// Mark several of the caller's notifications read; foreign ids are ignored
#[utoipa::path(
    post,
    path = "/bulk-mark-read",
    tag = "notifications",
    request_body = BulkMarkRead,
    responses(
        (status = 200, description = "Number of rows that changed", body = MarkedRead),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn bulk_mark_read(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(input): ValidatedJson<BulkMarkRead>,
) -> Result<impl IntoResponse, AppError> {
    let marked = service
        .bulk_mark_read(claims.tenant_id, claims.user_id(), input.ids)
        .await?;
    Ok(Json(marked))
}
