use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::gate::authenticate;
use crate::error::AppError;
use crate::state::AppState;

/// Runs the authentication pipeline in front of every wrapped route and stores
/// the resulting [`Identity`](crate::auth::Identity) in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::internal("Auth middleware", "AppState is not registered"))?;

            let identity = authenticate(&state, req.headers()).await?;
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, PasswordHasher};
    use crate::models::NewUser;
    use crate::store::{MemoryCredentialStore, MemoryTaskStore};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App, HttpResponse};
    use chrono::Duration;
    use std::sync::Arc;

    const TEST_COST: u32 = 4;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.user.email.clone())
    }

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryTaskStore::new()),
            PasswordHasher::new(TEST_COST),
            b"test_secret_key_at_least_32_bytes!",
            Duration::hours(1),
        )
        .unwrap()
    }

    #[actix_rt::test]
    async fn test_middleware_attaches_identity() {
        let state = state();
        let digest = state.hasher.hash("Test1234").unwrap();
        let user = state
            .credentials
            .create_user(NewUser {
                name: "mostafa".into(),
                email: "a@b.com".into(),
                password_hash: digest,
            })
            .await
            .unwrap();
        let issued = state.tokens.issue(user.id).await.unwrap();

        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(
                web::scope("/private")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", issued.token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "a@b.com");
    }

    #[actix_rt::test]
    async fn test_middleware_rejects_missing_token() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).service(
                web::scope("/private")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
