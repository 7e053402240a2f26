use super::config::JwtConfig;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ADMIN_ROLES: [&str; 2] = ["admin", "owner"];

/// Claims the notifier relies on. Extra claims in the token are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantClaims {
    /// User id.
    pub sub: i64,
    pub tenant_id: i64,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl TenantClaims {
    pub fn user_id(&self) -> i64 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        ADMIN_ROLES
            .iter()
            .any(|r| self.role.eq_ignore_ascii_case(r))
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin role required".to_string()))
        }
    }
}

/// Pulls the claims inserted by [`jwt_auth_middleware`](super::jwt_auth_middleware).
impl<S> FromRequestParts<S> for TenantClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantClaims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))
    }
}

#[derive(Clone)]
pub struct JwtAuth {
    inner: Arc<Keys>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;

        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(config.secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.secret.as_bytes()),
                validation,
            }),
        }
    }

    /// Mints a token; the host application normally does this, tests and tooling use it here.
    pub fn issue(
        &self,
        tenant_id: i64,
        user_id: i64,
        role: &str,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = TenantClaims {
            sub: user_id,
            tenant_id,
            role: role.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<TenantClaims, jsonwebtoken::errors::Error> {
        decode::<TenantClaims>(token, &self.inner.decoding, &self.inner.validation)
            .map(|data| data.claims)
    }
}
