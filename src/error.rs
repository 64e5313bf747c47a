//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a request can run into, from a malformed body to a store outage, ends up
//! as one of its variants.
//!
//! `AppError` implements `actix_web::error::ResponseError` to turn application errors into
//! HTTP responses with a `{ "error": ... }` JSON body. Internal failures are logged with
//! their detail but reach the client only as a generic message.
//! `From` implementations for `sqlx::Error`, `bcrypt::BcryptError`,
//! `jsonwebtoken::errors::Error` and `actix_web::error::BlockingError` allow
//! the `?` operator to be used across layers.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Message returned for every authentication failure, whatever the cause.
pub const UNAUTHORIZED_MESSAGE: &str = "Please authenticate.";
/// Message returned for a failed login, whether the email or the password was wrong.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";
/// Message returned for a registration against an email that is already taken.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already in use.";
/// Message returned when a task update names a field that may not be updated.
pub const INVALID_UPDATE_MESSAGE: &str = "Invalid updates!";
/// Message returned to the client for every internal failure.
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred.";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed, user-correctable input (HTTP 400).
    Validation(String),
    /// Registration with an email that already belongs to an account (HTTP 400).
    DuplicateEmail,
    /// Login with an unknown email or a wrong password (HTTP 400).
    /// Both cases share one message so accounts cannot be enumerated.
    InvalidCredentials,
    /// A task update touched a field outside `title`, `description`, `completed` (HTTP 400).
    InvalidUpdate,
    /// Missing, malformed, forged, revoked or orphaned bearer token (HTTP 401).
    Unauthorized,
    /// The resource is absent or belongs to someone else (HTTP 404).
    NotFound(String),
    /// Store, hashing or signing failure (HTTP 500). The detail is logged, never returned.
    Internal(String),
}

impl AppError {
    pub fn internal(context: &str, detail: impl fmt::Display) -> Self {
        AppError::Internal(format!("{}: {}", context, detail))
    }

    /// Picks one message out of `errors`, checking fields in `field_order`
    /// so the client always sees the first failing field.
    pub fn from_validation(errors: &ValidationErrors, field_order: &[&str]) -> Self {
        let field_errors = errors.field_errors();
        let message = field_order
            .iter()
            .filter_map(|field| {
                field_errors
                    .iter()
                    .find(|(name, _)| **name == *field)
                    .map(|(_, errs)| *errs)
            })
            .chain(field_errors.values().copied())
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid input.".to_string());
        AppError::Validation(message)
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::DuplicateEmail => DUPLICATE_EMAIL_MESSAGE.to_string(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::InvalidUpdate => INVALID_UPDATE_MESSAGE.to_string(),
            AppError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            AppError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DuplicateEmail => write!(f, "Duplicate Email"),
            AppError::InvalidCredentials => write!(f, "Invalid Credentials"),
            AppError::InvalidUpdate => write!(f, "Invalid Update"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateEmail
            | AppError::InvalidCredentials
            | AppError::InvalidUpdate => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            log::error!("{}", detail);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.client_message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError::Internal`.
///
/// Lookups use `fetch_optional`, so a missing row is never an error here.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::internal("Database error", error)
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::internal("Password hashing failed", error)
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
///
/// The reason is logged at debug level and dropped; the client only learns that
/// authentication failed.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        log::debug!("Rejected token: {}", error);
        AppError::Unauthorized
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::internal("Blocking task failed", error)
    }
}
