use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::gate::Identity;
use crate::error::AppError;

/// The caller's [`Identity`], as attached by `AuthMiddleware`.
///
/// Only meaningful on routes wrapped by the middleware; elsewhere extraction
/// fails with `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity))),
            None => {
                log::error!("No identity on request to {}; is AuthMiddleware applied?", req.path());
                ready(Err(AppError::Unauthorized.into()))
            }
        }
    }
}
