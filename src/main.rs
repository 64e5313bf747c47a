use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use taskguard::config::Config;
use taskguard::routes;
use taskguard::state::AppState;
use taskguard::store::{
    self, CredentialStore, MemoryCredentialStore, MemoryTaskStore, PostgresCredentialStore,
    PostgresTaskStore, TaskStore,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (credentials, tasks): (Arc<dyn CredentialStore>, Arc<dyn TaskStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = store::postgres::connect(url, config.database_max_connections)
                    .await
                    .map_err(to_io)?;
                log::info!("Connected to PostgreSQL");
                (
                    Arc::new(PostgresCredentialStore::new(pool.clone())),
                    Arc::new(PostgresTaskStore::new(pool)),
                )
            }
            None => {
                log::warn!("DATABASE_URL not set; data lives in memory and is lost on exit");
                (
                    Arc::new(MemoryCredentialStore::new()),
                    Arc::new(MemoryTaskStore::new()),
                )
            }
        };

    let state = AppState::from_config(&config, credentials, tasks).map_err(to_io)?;
    let state = web::Data::new(state);

    log::info!("Starting taskguard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

fn to_io(e: taskguard::AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}
