pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::UserProfile;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use gate::Identity;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use service::AccountService;
pub use token::{Claims, IssuedToken, TokenService, VerifiedToken};

/// Represents the payload for a user login request.
///
/// Fields default to empty strings so that a missing field is answered with the
/// same generic credentials error as a wrong one.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name; at least 2 characters once trimmed.
    #[serde(default)]
    #[validate(custom(
        function = "crate::validation::name_policy",
        message = "Name must be at least 2 characters long."
    ))]
    pub name: String,
    /// Email address; must look like `local@domain.tld`.
    #[serde(default)]
    #[validate(custom(function = "crate::validation::email_syntax", message = "Invalid email format."))]
    pub email: String,
    /// At least 8 characters with a lowercase letter, an uppercase letter and a digit.
    #[serde(default)]
    #[validate(custom(
        function = "crate::validation::password_policy",
        message = "Password must be at least 8 characters long and contain at least one lowercase letter, one uppercase letter, and one digit."
    ))]
    pub password: String,
}

/// Response structure after successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    /// Signed bearer token to present as `Authorization: Bearer <token>`.
    pub token: String,
}

/// Body for responses that only carry a confirmation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{EMAIL_MESSAGE, NAME_MESSAGE, PASSWORD_MESSAGE};
    use validator::ValidationErrors;

    fn messages(errors: &ValidationErrors) -> Vec<String> {
        errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect()
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "mostafa".to_string(),
            email: "a@b.com".to_string(),
            password: "Test1234".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = RegisterRequest {
            name: "m".to_string(),
            email: "testexample.com".to_string(),
            password: "test1234".to_string(),
        };
        let errors = invalid.validate().unwrap_err();
        let found = messages(&errors);
        assert_eq!(found.len(), 3);
        assert!(found.contains(&NAME_MESSAGE.to_string()));
        assert!(found.contains(&EMAIL_MESSAGE.to_string()));
        assert!(found.contains(&PASSWORD_MESSAGE.to_string()));
    }

    #[test]
    fn test_login_request_defaults_missing_fields() {
        let login: LoginRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(login.email, "a@b.com");
        assert!(login.password.is_empty());
    }
}
