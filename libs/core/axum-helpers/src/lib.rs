//! # Axum Helpers
//!
//! Shared HTTP plumbing for the notifier services.
//!
//! - **[`auth`]**: stateless bearer JWT carrying the caller's tenant, user and role
//! - **[`errors`]**: [`AppError`] and the JSON [`ErrorResponse`] envelope
//! - **[`extractors`]**: [`ValidatedJson`] and [`UuidPath`]
//! - **[`server`]**: router assembly with OpenAPI docs, health probes, graceful shutdown
//!
//! ```ignore
//! use axum_helpers::server::{ShutdownCoordinator, create_app, create_router};
//!
//! let router = create_router::<ApiDoc>(api_routes)?;
//! create_app(router, &ServerConfig::default(), ShutdownCoordinator::new()).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod server;

pub use auth::{JwtAuth, JwtConfig, TenantClaims, jwt_auth_middleware};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{UuidPath, ValidatedJson};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_app, create_router, health_router,
    run_health_checks,
};
