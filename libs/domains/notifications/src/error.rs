//! Error types for the notifications domain.

use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use axum_helpers::errors::validation_details;
use core_config::ConfigError;
use serde_json::{Value, json};
use thiserror::Error;
use validator::ValidationErrors;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// Input rejected; `fields` maps field names to messages.
    #[error("Validation failed: {message}")]
    Validation { message: String, fields: Value },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A trigger's recipient configuration could not be resolved.
    #[error("Recipient resolution failed: {0}")]
    RecipientResolution(String),

    /// A trigger's condition document is malformed.
    #[error("Invalid trigger condition: {0}")]
    Condition(String),

    #[error("Template rendering error: {0}")]
    Template(String),

    #[error("Email provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotificationError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            fields: json!({ field: [message.clone()] }),
            message,
        }
    }

    /// Validation failure carrying several messages for the `errors` field.
    pub fn invalid_many(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: json!({ "errors": errors }),
        }
    }
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<ConfigError> for NotificationError {
    fn from(err: ConfigError) -> Self {
        NotificationError::Config(err.to_string())
    }
}

impl From<ValidationErrors> for NotificationError {
    fn from(err: ValidationErrors) -> Self {
        NotificationError::Validation {
            message: "Request validation failed".to_string(),
            fields: validation_details(&err),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Validation { message, fields } => AppError::InvalidFields {
                message,
                details: fields,
            },
            NotificationError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            NotificationError::Unauthorized(msg) => AppError::Unauthorized(msg),
            NotificationError::Forbidden(msg) => AppError::Forbidden(msg),
            e @ (NotificationError::RecipientResolution(_)
            | NotificationError::Condition(_)
            | NotificationError::Template(_)) => AppError::UnprocessableEntity(e.to_string()),
            NotificationError::Provider(msg) => AppError::Upstream(msg),
            NotificationError::Database(msg) => AppError::Database(msg),
            NotificationError::Config(msg) | NotificationError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn invalid_names_the_field() {
        let err = NotificationError::invalid("fromEmail", "must be an email address");
        match err {
            NotificationError::Validation { fields, .. } => {
                assert_eq!(fields["fromEmail"][0], "must be an email address");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn maps_to_http_statuses() {
        let cases = [
            (NotificationError::invalid("title", "required"), StatusCode::BAD_REQUEST),
            (NotificationError::NotFound("Notification".into()), StatusCode::NOT_FOUND),
            (NotificationError::Forbidden("admin".into()), StatusCode::FORBIDDEN),
            (NotificationError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (NotificationError::Condition("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
        }
    }
}
