use chrono::Duration;
use std::sync::Arc;

use crate::auth::{AccountService, Identity, PasswordHasher, TokenService};
use crate::config::Config;
use crate::error::AppError;
use crate::models::PasswordDigest;
use crate::store::{CredentialStore, TaskStore};
use crate::tasks::OwnedTasks;

/// Shared application state, built once at startup and handed to every
/// request through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
    // verified against when a login names an unknown email
    pub(crate) dummy_digest: PasswordDigest,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tasks: Arc<dyn TaskStore>,
        hasher: PasswordHasher,
        secret: &[u8],
        token_ttl: Duration,
    ) -> Result<Self, AppError> {
        let tokens = TokenService::new(secret, token_ttl, credentials.clone());
        let dummy_digest = hasher.hash("dummy-password-for-unknown-accounts")?;
        Ok(Self {
            credentials,
            tasks,
            hasher,
            tokens,
            dummy_digest,
        })
    }

    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Result<Self, AppError> {
        Self::new(
            credentials,
            tasks,
            PasswordHasher::new(config.bcrypt_cost),
            config.jwt_secret.expose().as_bytes(),
            Duration::hours(config.token_ttl_hours),
        )
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self)
    }

    /// Task operations scoped to the authenticated caller.
    pub fn tasks_of(&self, identity: &Identity) -> OwnedTasks<'_> {
        OwnedTasks::new(self.tasks.as_ref(), identity.user_id())
    }
}
