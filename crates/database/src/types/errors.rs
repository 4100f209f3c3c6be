//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Errors raised by the user and profile repositories.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Phone number already exists")]
    PhoneAlreadyExists,

    #[error("Commercial registration number already exists")]
    CommercialRegistrationAlreadyExists,

    #[error("Tax number already exists")]
    TaxNumberAlreadyExists,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Corrupt row: {0}")]
    SerializationError(String),
}

impl UserError {
    /// True for the unique-constraint family.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            UserError::EmailAlreadyExists
                | UserError::PhoneAlreadyExists
                | UserError::CommercialRegistrationAlreadyExists
                | UserError::TaxNumberAlreadyExists
                | UserError::UserAlreadyExists
        )
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => UserError::UserNotFound,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                if message.contains("UNIQUE constraint failed") {
                    if message.contains("users.email") {
                        UserError::EmailAlreadyExists
                    } else if message.contains("users.phone") {
                        UserError::PhoneAlreadyExists
                    } else if message.contains("users.commercial_registration") {
                        UserError::CommercialRegistrationAlreadyExists
                    } else if message.contains("users.tax_number") {
                        UserError::TaxNumberAlreadyExists
                    } else {
                        UserError::UserAlreadyExists
                    }
                } else if message.contains("FOREIGN KEY constraint failed") {
                    UserError::UserNotFound
                } else {
                    UserError::DatabaseError(message.to_string())
                }
            }
            sqlx::Error::ColumnDecode { index, source } => {
                UserError::SerializationError(format!("column {index}: {source}"))
            }
            _ => UserError::DatabaseError(err.to_string()),
        }
    }
}
