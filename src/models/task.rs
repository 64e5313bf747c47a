use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Fields a client may change on an existing task.
pub const UPDATABLE_FIELDS: [&str; 3] = ["title", "description", "completed"];

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Input structure for creating a task.
///
/// Missing strings default to empty so that they fail validation with a readable
/// message instead of a deserialization error. Any `owner` key in the body is ignored;
/// the owner always comes from the authenticated identity.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Must not be blank.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Title cannot be empty."))]
    pub title: String,

    /// The description of the task. Must not be blank.
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Description cannot be empty."))]
    pub description: String,

    /// Completion flag as sent. `None` when the key is absent; an explicit
    /// `null` or any non-boolean is kept so that `check` can reject it.
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TaskInput {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::from_validation(&errors, &["title", "description"]))?;
        match &self.completed {
            Some(value) if !value.is_boolean() => Err(completed_not_boolean()),
            _ => Ok(()),
        }
    }

    fn completed_flag(&self) -> bool {
        self.completed
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn completed_not_boolean() -> AppError {
    AppError::Validation("Completed must be a boolean.".into())
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Identifier of the user who created the task. Set once, never changed.
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` from validated input, owned by `owner`.
    pub fn new(input: TaskInput, owner: Uuid) -> Self {
        let now = Utc::now();
        let completed = input.completed_flag();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            completed,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies every present field of `changes` and bumps `updated_at`.
    pub fn apply(&mut self, changes: &TaskUpdate) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

/// A validated partial update of a task.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Parses a raw PATCH body.
    ///
    /// Any key outside [`UPDATABLE_FIELDS`] rejects the whole update before a single
    /// field is looked at. Wrongly typed or blank values are validation errors.
    pub fn from_body(body: Map<String, Value>) -> Result<Self, AppError> {
        if !body
            .keys()
            .all(|key| UPDATABLE_FIELDS.contains(&key.as_str()))
        {
            return Err(AppError::InvalidUpdate);
        }

        // null would otherwise read as an absent key
        if body.get("title").map_or(false, Value::is_null) {
            return Err(AppError::Validation("Title cannot be empty.".into()));
        }
        if body.get("description").map_or(false, Value::is_null) {
            return Err(AppError::Validation("Description cannot be empty.".into()));
        }
        if body.get("completed").map_or(false, |value| !value.is_boolean()) {
            return Err(completed_not_boolean());
        }

        let update: TaskUpdate = serde_json::from_value(Value::Object(body))
            .map_err(|e| AppError::Validation(format!("Invalid update body: {}", e)))?;

        let blank =
            |field: &Option<String>| field.as_deref().map_or(false, |v| not_blank(v).is_err());
        if blank(&update.title) {
            return Err(AppError::Validation("Title cannot be empty.".into()));
        }
        if blank(&update.description) {
            return Err(AppError::Validation("Description cannot be empty.".into()));
        }

        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Exact match on the completion flag. `true` or `false`; an empty value
    /// means no filter.
    #[serde(default, deserialize_with = "completed_filter")]
    pub completed: Option<bool>,
}

fn completed_filter<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "" => Ok(None),
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!(
            "invalid completed filter {:?}",
            other
        ))),
    }
}

/// Message for an unknown id, a foreign id and a malformed id alike.
pub fn task_not_found() -> AppError {
    AppError::NotFound("Task not found.".into())
}
