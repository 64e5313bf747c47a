use actix_web::{delete, get, post, web, HttpResponse, Responder};

use crate::{
    auth::{AuthMiddleware, AuthenticatedUser, LoginRequest, MessageResponse, RegisterRequest},
    error::AppError,
    state::AppState,
};

/// Register a new user
///
/// Creates the account and returns its public profile with a first token.
///
/// ## Responses:
/// - `201 Created`: `{ user: { name, email }, token }`
/// - `400 Bad Request`: a policy violation, or the email is already in use
#[post("")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let response = state.accounts().register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{ user: { name, email }, token }`
/// - `400 Bad Request`: "Invalid email or password." for any credential mismatch
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = state.accounts().login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// The caller's own profile.
#[get("/me", wrap = "AuthMiddleware")]
pub async fn me(state: web::Data<AppState>, user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(state.accounts().profile(&user.0))
}

/// Deletes the caller's account together with every task and token it owns.
#[delete("/me", wrap = "AuthMiddleware")]
pub async fn delete_me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.accounts().delete_account(&user.0).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Account deleted successfully.")))
}

/// Ends the session of the token used for this request.
#[post("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.accounts().logout(&user.0).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out successfully.")))
}

/// Ends every session of the caller.
#[post("/logoutAll", wrap = "AuthMiddleware")]
pub async fn logout_all(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let revoked = state.accounts().logout_all(&user.0).await?;
    log::info!("User {} logged out of {} session(s)", user.0.user_id(), revoked);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out of all sessions.")))
}
