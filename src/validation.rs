//! Input validators shared by the account and task routes.

use lazy_static::lazy_static;
use regex::Regex;
use validator::{Validate, ValidationError};

use crate::auth::RegisterRequest;
use crate::error::AppError;
use crate::models::TaskInput;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

pub const NAME_MESSAGE: &str = "Name must be at least 2 characters long.";
pub const EMAIL_MESSAGE: &str = "Invalid email format.";
pub const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters long and contain at least one lowercase letter, one uppercase letter, and one digit.";

lazy_static! {
    // local@domain.tld with no whitespace and exactly one '@'
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub(crate) fn name_policy(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < 2 {
        return Err(ValidationError::new("name_too_short"));
    }
    Ok(())
}

pub(crate) fn email_syntax(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(ValidationError::new("email_syntax"));
    }
    Ok(())
}

pub(crate) fn password_policy(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("weak_password"))
    }
}

/// Checks a registration payload, reporting the first failing field in
/// `name`, `email`, `password` order.
pub fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|errors| AppError::from_validation(&errors, &["name", "email", "password"]))
}

/// Checks a task creation payload. `completed` is already strictly typed by
/// deserialization, so only the text fields are examined here.
pub fn validate_task_input(input: &TaskInput) -> Result<(), AppError> {
    input.check()
}
