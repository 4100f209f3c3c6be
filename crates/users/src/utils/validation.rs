//! Input validation utilities.

use regex::Regex;
use rust_decimal::Decimal;

use crate::types::{AccountError, AccountResult};

pub const PHONE_PATTERN: &str = r"^\+?1?\d{9,15}$";
pub const IBAN_PATTERN: &str = r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{1,30}$";

pub const MAX_COMPANY_NAME_LENGTH: usize = 150;
pub const MAX_REGISTRATION_LENGTH: usize = 50;

fn is_match(pattern: &str, value: &str) -> AccountResult<bool> {
    let regex = Regex::new(pattern)
        .map_err(|e| AccountError::validation(format!("invalid pattern {pattern}: {e}")))?;
    Ok(regex.is_match(value))
}

/// Validate email format
pub fn validate_email(email: &str) -> AccountResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AccountError::validation("email: an email address is required"));
    }

    if email.len() > 254 {
        return Err(AccountError::validation("email: address too long"));
    }

    if !is_match(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$", email)? {
        return Err(AccountError::validation("email: enter a valid email address"));
    }

    Ok(())
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a phone or WhatsApp number
pub fn validate_phone(field: &str, phone: &str) -> AccountResult<()> {
    if !is_match(PHONE_PATTERN, phone.trim())? {
        return Err(AccountError::validation(format!(
            "{field}: phone number must be entered in the format '+999999999', up to 15 digits"
        )));
    }
    Ok(())
}

/// Commercial registration numbers are digits only
pub fn validate_commercial_registration(registration: &str) -> AccountResult<()> {
    let registration = registration.trim();
    if registration.is_empty() {
        return Err(AccountError::validation(
            "commercial_registration: a commercial registration number is required",
        ));
    }
    validate_length("commercial_registration", registration, MAX_REGISTRATION_LENGTH)?;
    if !registration.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccountError::validation(
            "commercial_registration: registration number must contain digits only",
        ));
    }
    Ok(())
}

pub fn validate_company_name(name: &str) -> AccountResult<()> {
    if name.trim().is_empty() {
        return Err(AccountError::validation("company_name: a company name is required"));
    }
    validate_length("company_name", name, MAX_COMPANY_NAME_LENGTH)
}

pub fn validate_iban(iban: &str) -> AccountResult<()> {
    if !is_match(IBAN_PATTERN, iban)? {
        return Err(AccountError::validation("iban_number: invalid IBAN"));
    }
    Ok(())
}

/// Validate URL format
pub fn validate_url(field: &str, url: &str) -> AccountResult<()> {
    if url.len() > 2048 {
        return Err(AccountError::validation(format!("{field}: URL too long")));
    }

    if !is_match(r"^https?://[^\s/$.?#].[^\s]*$", url)? {
        return Err(AccountError::validation(format!("{field}: enter a valid URL")));
    }

    Ok(())
}

/// Character-count limit for free-text columns
pub fn validate_length(field: &str, value: &str, max: usize) -> AccountResult<()> {
    if value.chars().count() > max {
        return Err(AccountError::validation(format!(
            "{field}: ensure this value has at most {max} characters"
        )));
    }
    Ok(())
}

/// Percentages are stored with two decimal places between 0 and 100
pub fn validate_percentage(field: &str, value: Decimal) -> AccountResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(AccountError::validation(format!(
            "{field}: must be between 0 and 100"
        )));
    }
    if value.normalize().scale() > 2 {
        return Err(AccountError::validation(format!(
            "{field}: at most 2 decimal places"
        )));
    }
    Ok(())
}

/// Validate password strength requirements
pub fn validate_password(password: &str) -> AccountResult<()> {
    if password.len() < 8 {
        return Err(AccountError::validation(
            "password: must be at least 8 characters long",
        ));
    }

    if password.len() > 128 {
        return Err(AccountError::validation(
            "password: must be less than 128 characters long",
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase {
        return Err(AccountError::validation(
            "password: must contain at least one lowercase letter",
        ));
    }

    if !has_uppercase {
        return Err(AccountError::validation(
            "password: must contain at least one uppercase letter",
        ));
    }

    if !has_digit {
        return Err(AccountError::validation(
            "password: must contain at least one digit",
        ));
    }

    Ok(())
}

/// Both password fields must match, then pass the strength policy
pub fn validate_password_pair(password1: &str, password2: &str) -> AccountResult<()> {
    if password1 != password2 {
        return Err(AccountError::PasswordMismatch);
    }
    validate_password(password1)
}
