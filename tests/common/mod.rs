#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App, Error};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;

use taskguard::auth::PasswordHasher;
use taskguard::routes;
use taskguard::state::AppState;
use taskguard::store::{MemoryCredentialStore, MemoryTaskStore};

pub const SECRET: &[u8] = b"integration_test_secret_32_bytes!";
// bcrypt's lowest work factor
pub const TEST_COST: u32 = 4;

pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemoryTaskStore::new()),
        PasswordHasher::new(TEST_COST),
        SECRET,
        Duration::hours(1),
    )
    .expect("state")
}

pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::config),
    )
    .await
}

/// Sends `req` and returns the status with the JSON body.
///
/// Auth failures surface from the middleware as service errors rather than
/// responses, so they are rendered here the way the HTTP server would.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, body) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .expect("error body");
            (status, body)
        }
    };
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, json)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers an account with a valid password and returns its token.
pub async fn register<S, B>(app: &S, name: &str, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "name": name, "email": email, "password": "Test1234" }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body["token"].as_str().expect("token").to_string()
}

pub async fn create_task<S, B>(app: &S, token: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(token))
        .set_json(json!({ "title": title, "description": "d" }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);
    body
}
