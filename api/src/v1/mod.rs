mod response;

pub use response::{ErrorBody, ErrorCode, Failure, Success};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TITLE_MAX_LENGTH: usize = 100;
pub const DESCRIPTION_MAX_LENGTH: usize = 500;

/// Current time at the millisecond precision todos are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Todo {
    fn default() -> Self {
        let now = now();

        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Todo {
    /// Builds a fresh, not yet persisted todo from validated input.
    pub fn new(input: NewTodo, now: DateTime<Utc>) -> Self {
        Self {
            title: input.title.trim().to_owned(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_owned(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    /// Returns a copy with every field present in `changes` overwritten.
    ///
    /// `updated_at` is always refreshed, and never moves before `created_at`.
    pub fn apply(&self, changes: &TodoChanges, now: DateTime<Utc>) -> Self {
        let mut todo = self.clone();

        if let Some(title) = &changes.title {
            todo.title = title.trim().to_owned();
        }

        if let Some(description) = &changes.description {
            todo.description = description.trim().to_owned();
        }

        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }

        todo.updated_at = now.max(todo.created_at);
        todo
    }

    pub fn toggled(&self, now: DateTime<Utc>) -> Self {
        Self {
            completed: !self.completed,
            updated_at: now.max(self.created_at),
            ..self.clone()
        }
    }
}

/// Body of a create request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Field changes for a full or partial update. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
