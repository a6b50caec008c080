use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use api::v1::Todo;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::{StoreError, TodoStore};

/// Todos held in process memory, optionally snapshotted to a JSON file.
///
/// Mutations only touch memory; [`TodoStore::flush`] writes the snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<PathBuf>,
    todos: Mutex<Vec<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot: Some(path.into()),
            todos: Mutex::default(),
        }
    }

    pub fn snapshot(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn save(&self, todo: Todo) -> Result<Todo, StoreError> {
        let mut todos = self.todos.lock().await;

        if todos.iter().any(|existing| existing.id == todo.id) {
            return Err(StoreError::Duplicate(todo.id));
        }

        todos.push(todo.clone());
        Ok(todo)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let mut todos = self.todos.lock().await.clone();
        // stable, so equal timestamps keep insertion order
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let todos = self.todos.lock().await;
        Ok(todos.iter().find(|todo| todo.id == id).cloned())
    }

    async fn update(&self, id: Uuid, todo: Todo) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.lock().await;

        let Some(slot) = todos.iter_mut().find(|existing| existing.id == id) else {
            return Ok(None);
        };

        *slot = todo.clone();
        Ok(Some(todo))
    }

    async fn remove(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.lock().await;

        let removed = todos
            .iter()
            .position(|todo| todo.id == id)
            .map(|index| todos.remove(index));

        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.todos.lock().await.len())
    }

    async fn load(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot found, starting empty");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let loaded: Vec<Todo> = serde_json::from_reader(io::BufReader::new(file))?;

        let mut seen = HashSet::with_capacity(loaded.len());
        if let Some(todo) = loaded.iter().find(|todo| !seen.insert(todo.id)) {
            return Err(StoreError::Duplicate(todo.id));
        }

        info!(count = loaded.len(), path = %path.display(), "loaded todos from snapshot");
        *self.todos.lock().await = loaded;

        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let todos = self.todos.lock().await;
        write_snapshot(path, &todos)?;

        info!(count = todos.len(), path = %path.display(), "wrote todo snapshot");
        Ok(())
    }
}

/// Writes next to the target and renames, so readers never see a partial file.
/// A failed write leaves neither a partial target nor the temporary file.
fn write_snapshot(path: &Path, todos: &[Todo]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = write_json(&tmp, todos).and_then(|()| Ok(fs::rename(&tmp, path)?));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }

    written
}

fn write_json(path: &Path, todos: &[Todo]) -> Result<(), StoreError> {
    let mut writer = io::BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, todos)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(())
}
