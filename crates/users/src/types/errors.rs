//! Error types for the account services.

use rental_database::{ProfileKind, UserError, UserType};
use thiserror::Error;

/// Errors raised while rendering or delivering email.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Invalid email message: {0}")]
    Message(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// Account service errors
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("The two password fields didn't match")]
    PasswordMismatch,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Staff access required")]
    StaffRequired,

    #[error("A {kind} profile requires user type {expected}, found {actual}")]
    ProfileRoleMismatch {
        kind: ProfileKind,
        expected: UserType,
        actual: UserType,
    },

    #[error("Superuser must have {0}=true")]
    InvalidSuperuserFlags(&'static str),

    #[error("Invalid verification token")]
    InvalidVerificationToken,

    #[error("Password hashing failed")]
    PasswordHashingFailed,

    #[error("Token creation failed: {0}")]
    TokenCreationFailed(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error(transparent)]
    Store(#[from] UserError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl AccountError {
    pub fn validation(message: impl Into<String>) -> Self {
        AccountError::ValidationFailed(message.into())
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
pub type NotificationResult<T> = Result<T, NotificationError>;
