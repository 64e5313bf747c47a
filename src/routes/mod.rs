pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::models::task::task_not_found;

/// Registers every route and the extractor error handlers.
///
/// `AppState` itself is not registered here; callers add it with `app_data`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("Rejected body on {}: {}", req.path(), err);
        AppError::Validation("Invalid request body.".into()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, req| {
        log::debug!("Rejected query on {}: {}", req.path(), err);
        AppError::Validation("Completed must be true or false.".into()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, req| {
        // a malformed id cannot name a task, so it reads like an unknown one
        log::debug!("Rejected path {}: {}", req.path(), err);
        task_not_found().into()
    }))
    .service(health::health)
    .service(
        web::scope("/users")
            .service(users::register)
            .service(users::login)
            .service(users::me)
            .service(users::delete_me)
            .service(users::logout)
            .service(users::logout_all),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
