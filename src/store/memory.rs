use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{NewUser, Task, TaskQuery, TaskUpdate, User};

struct UserRecord {
    user: User,
    tokens: HashSet<Uuid>,
}

#[derive(Default)]
struct Accounts {
    by_id: HashMap<Uuid, UserRecord>,
    // normalized email -> id
    by_email: HashMap<String, Uuid>,
}

/// Credential store held in process memory.
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: RwLock<Accounts>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let key = normalize_email(&new_user.email);
        let mut accounts = self.accounts.write().await;
        if accounts.by_email.contains_key(&key) {
            return Err(AppError::DuplicateEmail);
        }

        let user = User::new(new_user);
        accounts.by_email.insert(key, user.id);
        accounts.by_id.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                tokens: HashSet::new(),
            },
        );
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| accounts.by_id.get(id))
            .map(|record| record.user.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.by_id.get(&id).map(|record| record.user.clone()))
    }

    async fn record_token_issuance(&self, user_id: Uuid, token_id: Uuid) -> Result<(), AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts.by_id.get_mut(&user_id) {
            Some(record) => {
                record.tokens.insert(token_id);
                Ok(())
            }
            None => Err(AppError::internal(
                "Cannot record token issuance",
                format!("unknown user {}", user_id),
            )),
        }
    }

    async fn has_token_issuance(&self, user_id: Uuid, token_id: Uuid) -> Result<bool, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .by_id
            .get(&user_id)
            .map_or(false, |record| record.tokens.contains(&token_id)))
    }

    async fn revoke_token_issuance(
        &self,
        user_id: Uuid,
        token_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts
            .by_id
            .get_mut(&user_id)
            .map_or(false, |record| record.tokens.remove(&token_id)))
    }

    async fn revoke_all_token_issuances(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.by_id.get_mut(&user_id).map_or(0, |record| {
            let removed = record.tokens.len() as u64;
            record.tokens.clear();
            removed
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts.by_id.remove(&id) {
            Some(record) => {
                accounts.by_email.remove(&normalize_email(&record.user.email));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Task store held in process memory.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, AppError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut found: Vec<Task> = tasks
            .values()
            .filter(|task| task.owner == owner)
            .filter(|task| query.completed.map_or(true, |c| task.completed == c))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|task| task.owner == owner).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .get_mut(&id)
            .filter(|task| task.owner == owner)
            .map(|task| {
                task.apply(changes);
                task.clone()
            }))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).map_or(false, |task| task.owner == owner);
        if !owned {
            return Ok(None);
        }
        Ok(tasks.remove(&id))
    }

    async fn delete_all_for_owner(&self, owner: Uuid) -> Result<u64, AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| task.owner != owner);
        Ok((before - tasks.len()) as u64)
    }
}
