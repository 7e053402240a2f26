use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_helpers::{AppError, TenantClaims};
use std::sync::Arc;

use crate::models::{AnalyticsReport, EmailDeliveryLog, EmailLogQuery, Page};
use crate::service::NotificationService;

/// Notification and email delivery aggregates for the tenant (cached)
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "analytics",
    responses(
        (status = 200, description = "Aggregates", body = AnalyticsReport),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn analytics(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    let report = service.analytics(claims.tenant_id).await?;
    Ok(Json(report))
}

/// Drop the tenant's cached analytics
#[utoipa::path(
    post,
    path = "/clear-cache",
    tag = "analytics",
    responses(
        (status = 204, description = "Cache cleared")
    )
)]
pub async fn clear_cache(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> impl IntoResponse {
    service.clear_cache(claims.tenant_id).await;
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/email-logs",
    tag = "analytics",
    params(EmailLogQuery),
    responses(
        (status = 200, description = "One page of delivery attempts", body = Page<EmailDeliveryLog>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn email_logs(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    Query(query): Query<EmailLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let logs = service.email_logs(claims.tenant_id, query).await?;
    Ok(Json(logs))
}
