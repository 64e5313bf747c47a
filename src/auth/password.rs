use actix_web::web;
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;
use crate::models::PasswordDigest;

/// Salted bcrypt hashing with a configurable work factor.
///
/// bcrypt compares digests in constant time. The async variants move the work
/// onto actix's blocking thread pool so a slow hash never stalls the workers
/// handling other requests.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<PasswordDigest, AppError> {
        hash(password, self.cost)
            .map(PasswordDigest::new)
            .map_err(|e| AppError::internal("Failed to hash password", e))
    }

    pub fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, AppError> {
        verify(password, digest.as_str())
            .map_err(|e| AppError::internal("Failed to verify password", e))
    }

    pub async fn hash_blocking(&self, password: String) -> Result<PasswordDigest, AppError> {
        let hasher = *self;
        web::block(move || hasher.hash(&password)).await?
    }

    pub async fn verify_blocking(
        &self,
        password: String,
        digest: PasswordDigest,
    ) -> Result<bool, AppError> {
        let hasher = *self;
        web::block(move || hasher.verify(&password, &digest)).await?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
