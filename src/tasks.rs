//! Owner-scoped access to the task store.
//!
//! Handlers never touch [`TaskStore`] directly; they obtain an [`OwnedTasks`] for the
//! authenticated identity, and every call through it carries that owner. A task id
//! that exists under someone else is reported exactly like one that does not exist.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::task::task_not_found;
use crate::models::{Task, TaskInput, TaskQuery, TaskUpdate};
use crate::store::TaskStore;
use crate::validation::validate_task_input;

pub struct OwnedTasks<'a> {
    store: &'a dyn TaskStore,
    owner: Uuid,
}

impl<'a> OwnedTasks<'a> {
    pub fn new(store: &'a dyn TaskStore, owner: Uuid) -> Self {
        Self { store, owner }
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Validates `input` and stores it as a new task owned by the caller.
    pub async fn create(&self, input: TaskInput) -> Result<Task, AppError> {
        validate_task_input(&input)?;
        let task = self.store.insert(Task::new(input, self.owner)).await?;
        log::debug!("User {} created task {}", self.owner, task.id);
        Ok(task)
    }

    pub async fn list(&self, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        self.store.list(self.owner, query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        self.store
            .find(id, self.owner)
            .await?
            .ok_or_else(task_not_found)
    }

    /// Applies a raw PATCH body. The body is checked in full before the store is
    /// consulted, so an update naming a forbidden field changes nothing.
    pub async fn update(&self, id: Uuid, body: Map<String, Value>) -> Result<Task, AppError> {
        let changes = TaskUpdate::from_body(body)?;
        if changes.is_empty() {
            return self.get(id).await;
        }
        self.store
            .update(id, self.owner, &changes)
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Task, AppError> {
        let task = self
            .store
            .delete(id, self.owner)
            .await?
            .ok_or_else(task_not_found)?;
        log::debug!("User {} deleted task {}", self.owner, task.id);
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTaskStore;
    use serde_json::json;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: "d".to_string(),
            completed: None,
        }
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[actix_rt::test]
    async fn test_create_sets_owner_from_identity() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let tasks = OwnedTasks::new(&store, owner);

        let task = tasks.create(input("Task1")).await.unwrap();
        assert_eq!(task.owner, owner);
        assert!(!task.completed);
    }

    #[actix_rt::test]
    async fn test_create_validates_input() {
        let store = MemoryTaskStore::new();
        let tasks = OwnedTasks::new(&store, Uuid::new_v4());

        assert!(matches!(
            tasks.create(input(" ")).await,
            Err(AppError::Validation(_))
        ));
        assert!(tasks.list(&TaskQuery::default()).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_other_owner_cannot_see_or_touch_task() {
        let store = MemoryTaskStore::new();
        let alice = OwnedTasks::new(&store, Uuid::new_v4());
        let bob = OwnedTasks::new(&store, Uuid::new_v4());
        let task = alice.create(input("private")).await.unwrap();

        assert!(bob.list(&TaskQuery::default()).await.unwrap().is_empty());
        assert!(matches!(bob.get(task.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            bob.update(task.id, body(json!({ "completed": true }))).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(bob.delete(task.id).await, Err(AppError::NotFound(_))));

        let unchanged = alice.get(task.id).await.unwrap();
        assert_eq!(unchanged, task);
    }

    #[actix_rt::test]
    async fn test_foreign_and_unknown_ids_look_the_same() {
        let store = MemoryTaskStore::new();
        let alice = OwnedTasks::new(&store, Uuid::new_v4());
        let bob = OwnedTasks::new(&store, Uuid::new_v4());
        let task = alice.create(input("private")).await.unwrap();

        let foreign = bob.get(task.id).await.unwrap_err().to_string();
        let unknown = bob.get(Uuid::new_v4()).await.unwrap_err().to_string();
        assert_eq!(foreign, unknown);
    }

    #[actix_rt::test]
    async fn test_invalid_update_changes_nothing() {
        let store = MemoryTaskStore::new();
        let tasks = OwnedTasks::new(&store, Uuid::new_v4());
        let task = tasks.create(input("original")).await.unwrap();

        let result = tasks
            .update(task.id, body(json!({ "title": "changed", "owner": "x" })))
            .await;
        assert!(matches!(result, Err(AppError::InvalidUpdate)));
        assert_eq!(tasks.get(task.id).await.unwrap().title, "original");

        let updated = tasks
            .update(task.id, body(json!({ "title": "changed", "completed": true })))
            .await
            .unwrap();
        assert_eq!(updated.title, "changed");
        assert!(updated.completed);
        assert_eq!(updated.owner, tasks.owner());
    }
}
