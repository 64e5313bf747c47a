//! Persistence ports for accounts and tasks, with in-memory and PostgreSQL adapters.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Task, TaskQuery, TaskUpdate, User};

pub use memory::{MemoryCredentialStore, MemoryTaskStore};
pub use postgres::{PostgresCredentialStore, PostgresTaskStore};

/// Persistence operations for user accounts and their token issuances.
///
/// Emails are compared case-insensitively. Implementations must keep writes to
/// distinct users independent of each other.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `DuplicateEmail` - an account with the same email (ignoring case) exists
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Add `token_id` to the user's active issuances. Recording the same id twice
    /// is a no-op.
    async fn record_token_issuance(&self, user_id: Uuid, token_id: Uuid) -> Result<(), AppError>;

    /// Whether `token_id` is currently an active issuance of `user_id`.
    async fn has_token_issuance(&self, user_id: Uuid, token_id: Uuid) -> Result<bool, AppError>;

    /// Remove one issuance. Returns whether it was present.
    async fn revoke_token_issuance(&self, user_id: Uuid, token_id: Uuid)
        -> Result<bool, AppError>;

    /// Remove every issuance of the user. Returns how many were removed.
    async fn revoke_all_token_issuances(&self, user_id: Uuid) -> Result<u64, AppError>;

    /// Remove the account and its issuances. Returns whether it existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Persistence operations for tasks.
///
/// Every operation on an existing task is addressed by `(id, owner)` jointly, so a
/// task id on its own never resolves a record.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn insert(&self, task: Task) -> Result<Task, AppError>;

    /// All tasks of `owner` matching `query`, oldest first.
    async fn list(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, AppError>;

    async fn find(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError>;

    /// Apply `changes` to the task and return the new state, or `None` when no
    /// task `(id, owner)` exists.
    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &TaskUpdate,
    ) -> Result<Option<Task>, AppError>;

    /// Remove and return the task, or `None` when no task `(id, owner)` exists.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError>;

    /// Remove every task of `owner`. Returns how many were removed.
    async fn delete_all_for_owner(&self, owner: Uuid) -> Result<u64, AppError>;
}
