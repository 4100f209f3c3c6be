//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rental_users::{AccountError, NotificationError, UserError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    AuthorizationFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    MailDelivery(String),

    #[error("{0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::MailDelivery(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status.as_str().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<UserError> for GatewayError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::UserNotFound => GatewayError::NotFound(error.to_string()),
            _ if error.is_conflict() => GatewayError::Conflict(error.to_string()),
            _ => GatewayError::InternalError(error.to_string()),
        }
    }
}

impl From<NotificationError> for GatewayError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::Template(_) => GatewayError::InternalError(error.to_string()),
            NotificationError::Message(_) | NotificationError::Transport(_) => {
                GatewayError::MailDelivery(error.to_string())
            }
        }
    }
}

impl From<AccountError> for GatewayError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::ValidationFailed(_)
            | AccountError::PasswordMismatch
            | AccountError::ProfileRoleMismatch { .. }
            | AccountError::InvalidSuperuserFlags(_)
            | AccountError::InvalidVerificationToken => {
                GatewayError::InvalidRequest(error.to_string())
            }
            AccountError::InvalidCredentials | AccountError::InvalidToken(_) => {
                GatewayError::AuthenticationFailed(error.to_string())
            }
            AccountError::AccountInactive | AccountError::StaffRequired => {
                GatewayError::AuthorizationFailed(error.to_string())
            }
            AccountError::PasswordHashingFailed | AccountError::TokenCreationFailed(_) => {
                GatewayError::InternalError(error.to_string())
            }
            AccountError::Store(inner) => inner.into(),
            AccountError::Notification(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_errors_map_to_statuses() {
        let cases = [
            (AccountError::validation("email: required"), StatusCode::BAD_REQUEST),
            (AccountError::PasswordMismatch, StatusCode::BAD_REQUEST),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AccountError::InvalidToken("x".into()), StatusCode::UNAUTHORIZED),
            (AccountError::AccountInactive, StatusCode::FORBIDDEN),
            (AccountError::StaffRequired, StatusCode::FORBIDDEN),
            (UserError::UserNotFound.into(), StatusCode::NOT_FOUND),
            (UserError::EmailAlreadyExists.into(), StatusCode::CONFLICT),
            (UserError::DatabaseError("boom".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (
                NotificationError::Transport("refused".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(GatewayError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_conflict_response_status() {
        let response = GatewayError::Conflict("Email already exists".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
