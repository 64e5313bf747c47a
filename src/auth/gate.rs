//! Request authentication as an ordered pipeline.
//!
//! `extract` → `verify` → `resolve`, each step returning either the input for the
//! next step or a terminal `AppError::Unauthorized`. Whatever step fails, the
//! client sees the same 401 body; only the server log records which step it was.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The authenticated caller, attached to the request once every step passed.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    /// Issuance id of the token that authenticated this request.
    pub token_id: Uuid,
}

impl Identity {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Step 1: pull the bearer token out of the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| reject("missing or unreadable Authorization header"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| reject("Authorization header has no scheme"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(reject("Authorization scheme is not Bearer"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(reject("empty bearer token"));
    }
    Ok(token)
}

/// Runs the whole pipeline against a request's headers.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    let token = extract_bearer(headers)?;

    // Step 2: signature, expiry and issuance record.
    let verified = state.tokens.verify(token).await.map_err(|e| match e {
        AppError::Unauthorized => reject("token failed verification"),
        other => other,
    })?;

    // Step 3: the user may have been deleted since the token was issued.
    let user = state
        .credentials
        .find_by_id(verified.user_id)
        .await?
        .ok_or_else(|| reject("token subject no longer exists"))?;

    Ok(Identity {
        user,
        token_id: verified.token_id,
    })
}

fn reject(reason: &str) -> AppError {
    log::warn!("Authentication rejected: {}", reason);
    AppError::Unauthorized
}
