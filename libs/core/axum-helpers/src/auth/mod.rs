//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the host application. They name the caller's
//! tenant, user and role; every notification query is scoped by those claims.
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let protected = Router::new()
//!     .route("/notifications", get(list))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod claims;
pub mod config;
pub mod middleware;

pub use claims::{JwtAuth, TenantClaims};
pub use config::JwtConfig;
pub use middleware::jwt_auth_middleware;
