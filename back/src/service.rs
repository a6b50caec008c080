use std::sync::Arc;

use api::v1::{self, Todo};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    store::{StoreError, TodoStore},
    validation::{self, ValidationError},
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug)]
pub struct TodoList {
    pub todos: Vec<Todo>,
    pub count: usize,
}

/// Use cases over a todo store. A missing todo is `Ok(None)`, never an error.
///
/// Input is validated before the store is touched, so a malformed body is
/// reported even when the id names nothing.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: &Value) -> Result<Todo, ServiceError> {
        let input = validation::validate_create(input)?;
        let todo = self.store.save(Todo::new(input, v1::now())).await?;

        info!(id = %todo.id, title = %todo.title, "created todo");

        Ok(todo)
    }

    pub async fn get_all(&self) -> Result<TodoList, ServiceError> {
        let todos = self.store.find_all().await?;
        let count = todos.len();

        Ok(TodoList { todos, count })
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        Ok(self.store.find_by_id(id).await?)
    }

    pub async fn full_update(&self, id: &str, input: &Value) -> Result<Option<Todo>, ServiceError> {
        let changes = validation::validate_full_update(input)?;
        self.modify(id, |todo| todo.apply(&changes, v1::now())).await
    }

    pub async fn partial_update(
        &self,
        id: &str,
        input: &Value,
    ) -> Result<Option<Todo>, ServiceError> {
        let changes = validation::validate_partial_update(input)?;
        self.modify(id, |todo| todo.apply(&changes, v1::now())).await
    }

    pub async fn toggle(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        self.modify(id, |todo| todo.toggled(v1::now())).await
    }

    pub async fn remove(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let removed = self.store.remove(id).await?;

        if let Some(todo) = &removed {
            info!(id = %todo.id, "deleted todo");
        }

        Ok(removed)
    }

    async fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&Todo) -> Todo,
    ) -> Result<Option<Todo>, ServiceError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };

        let Some(existing) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        let updated = self.store.update(id, change(&existing)).await?;

        if let Some(todo) = &updated {
            info!(
                id = %todo.id,
                completed = todo.completed,
                "updated todo"
            );
        }

        Ok(updated)
    }
}

/// Ids that are not UUIDs cannot name a stored todo.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::{MemoryStore, SqliteStore};

    fn service() -> TodoService {
        TodoService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let service = service();

        let todo = service.create(&json!({ "title": "  Buy milk  " })).await.unwrap();

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, "");
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(service.get_by_id(&todo.id.to_string()).await.unwrap(), Some(todo));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let service = service();

        for body in [json!({ "title": "" }), json!({ "title": "   " })] {
            let err = service.create(&body).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(ValidationError::TitleEmpty)));
        }

        let err = service.create(&json!({ "title": "x".repeat(101) })).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ValidationError::TitleTooLong)));

        assert_eq!(service.get_all().await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn validation_runs_before_lookup() {
        let err = service()
            .full_update("not-a-uuid", &json!({ "title": "t" }))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(ValidationError::CompletedNotBoolean)));
    }

    #[tokio::test]
    async fn partial_update_changes_only_given_fields() {
        let service = service();
        let todo = service
            .create(&json!({ "title": "Buy milk", "description": "semi-skimmed" }))
            .await
            .unwrap();

        let patched = service
            .partial_update(&todo.id.to_string(), &json!({ "completed": true }))
            .await
            .unwrap()
            .unwrap();

        assert!(patched.completed);
        assert_eq!(patched.title, todo.title);
        assert_eq!(patched.description, todo.description);
        assert_eq!(patched.created_at, todo.created_at);
        assert!(patched.updated_at >= todo.updated_at);
    }

    #[tokio::test]
    async fn full_update_replaces_every_field() {
        let service = service();
        let todo = service
            .create(&json!({ "title": "Buy milk", "description": "semi-skimmed" }))
            .await
            .unwrap();

        let replaced = service
            .full_update(&todo.id.to_string(), &json!({ "title": "Buy bread", "completed": true }))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.title, "Buy bread");
        assert_eq!(replaced.description, "");
        assert!(replaced.completed);
        assert_eq!(service.get_by_id(&todo.id.to_string()).await.unwrap(), Some(replaced));
    }

    #[tokio::test]
    async fn toggle_twice_restores_completed() {
        let service = service();
        let todo = service.create(&json!({ "title": "Buy milk" })).await.unwrap();

        let once = service.toggle(&todo.id.to_string()).await.unwrap().unwrap();
        let twice = service.toggle(&todo.id.to_string()).await.unwrap().unwrap();

        assert!(once.completed);
        assert!(!twice.completed);
        assert!(twice.updated_at >= once.updated_at);
        assert!(once.updated_at >= todo.updated_at);
    }

    #[tokio::test]
    async fn missing_ids_are_absent() {
        let service = service();
        let id = &Uuid::new_v4().to_string();

        assert_eq!(service.get_by_id(id).await.unwrap(), None);
        assert_eq!(service.get_by_id("not-a-uuid").await.unwrap(), None);
        assert_eq!(service.toggle(id).await.unwrap(), None);
        assert_eq!(service.remove(id).await.unwrap(), None);
        assert_eq!(
            service.partial_update(id, &json!({ "completed": true })).await.unwrap(),
            None
        );
        assert_eq!(
            service
                .full_update(id, &json!({ "title": "t", "completed": true }))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn removed_todos_are_gone() {
        let service = service();
        let todo = service.create(&json!({ "title": "Buy milk" })).await.unwrap();

        assert_eq!(service.remove(&todo.id.to_string()).await.unwrap(), Some(todo.clone()));
        assert_eq!(service.get_by_id(&todo.id.to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn behaves_the_same_over_sqlite() {
        let service = TodoService::new(Arc::new(SqliteStore::open_in_memory().unwrap()));

        let todo = service.create(&json!({ "title": "Buy milk" })).await.unwrap();
        assert_eq!(service.get_by_id(&todo.id.to_string()).await.unwrap(), Some(todo.clone()));

        let toggled = service.toggle(&todo.id.to_string()).await.unwrap().unwrap();
        assert!(toggled.completed);

        let list = service.get_all().await.unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.todos, vec![toggled]);
    }
}
