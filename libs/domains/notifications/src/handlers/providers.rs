use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{AppError, TenantClaims, UuidPath, ValidatedJson};
use std::sync::Arc;

use crate::models::{
    CreateEmailProvider, DeliveryOutcome, EmailProviderView, TestEmailRequest, UpdateEmailProvider,
};
use crate::service::NotificationService;

/// List the tenant's email providers, secrets masked
#[utoipa::path(
    get,
    path = "/email-providers",
    tag = "email-providers",
    responses(
        (status = 200, description = "Configured providers", body = Vec<EmailProviderView>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_providers(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let providers = service.list_providers(claims.tenant_id).await?;
    Ok(Json(providers))
}

#[utoipa::path(
    get,
    path = "/email-providers/{id}",
    tag = "email-providers",
    params(
        ("id" = String, Path, description = "Provider ID")
    ),
    responses(
        (status = 200, description = "Provider found", body = EmailProviderView),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn get_provider(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let provider = service.get_provider(claims.tenant_id, id).await?;
    Ok(Json(provider))
}

/// Store a provider; `isActive: true` makes it the tenant's only active one
#[utoipa::path(
    post,
    path = "/email-providers",
    tag = "email-providers",
    request_body = CreateEmailProvider,
    responses(
        (status = 201, description = "Provider created", body = EmailProviderView),
        (status = 400, description = "Invalid provider configuration"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_provider(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    ValidatedJson(input): ValidatedJson<CreateEmailProvider>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let provider = service.create_provider(claims.tenant_id, input).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// Update a provider. Masked secrets sent back unchanged keep their stored value.
#[utoipa::path(
    put,
    path = "/email-providers/{id}",
    tag = "email-providers",
    params(
        ("id" = String, Path, description = "Provider ID")
    ),
    request_body = UpdateEmailProvider,
    responses(
        (status = 200, description = "Provider updated", body = EmailProviderView),
        (status = 400, description = "Invalid provider configuration"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn update_provider(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateEmailProvider>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let provider = service.update_provider(claims.tenant_id, id, input).await?;
    Ok(Json(provider))
}

#[utoipa::path(
    delete,
    path = "/email-providers/{id}",
    tag = "email-providers",
    params(
        ("id" = String, Path, description = "Provider ID")
    ),
    responses(
        (status = 204, description = "Provider deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn delete_provider(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    service.delete_provider(claims.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a test message through this provider, active or not
#[utoipa::path(
    post,
    path = "/email-providers/{id}/test",
    tag = "email-providers",
    params(
        ("id" = String, Path, description = "Provider ID")
    ),
    request_body = TestEmailRequest,
    responses(
        (status = 200, description = "Attempt made and logged", body = DeliveryOutcome),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn test_provider(
    State(service): State<Arc<NotificationService>>,
    claims: TenantClaims,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<TestEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;
    let outcome = service.test_provider(claims.tenant_id, id, input).await?;
    Ok(Json(outcome))
}
