mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use api::v1::Todo;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("duplicate todo id {0}")]
    Duplicate(Uuid),
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Persistence contract shared by every backing medium.
///
/// Lookups that find nothing return `None`; errors are reserved for failures
/// of the medium itself.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn save(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// All todos, most recently created first.
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn update(&self, id: Uuid, todo: Todo) -> Result<Option<Todo>, StoreError>;

    async fn remove(&self, id: Uuid) -> Result<Option<Todo>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Populates the store at startup.
    async fn load(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Makes pending state durable before shutdown.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
