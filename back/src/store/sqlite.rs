use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use api::v1::Todo;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use super::{StoreError, TodoStore};

const COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

/// Todos kept in a SQLite table, one parameterized statement per operation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;

        Self::migrate(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
              id TEXT PRIMARY KEY NOT NULL,
              title TEXT NOT NULL,
              description TEXT NOT NULL DEFAULT '',
              completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos(created_at DESC);
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn save(&self, todo: Todo) -> Result<Todo, StoreError> {
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                r#"
                INSERT INTO todos (id, title, description, completed, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    todo.id.to_string(),
                    todo.title,
                    todo.description,
                    todo.completed,
                    timestamp(&todo.created_at),
                    timestamp(&todo.updated_at),
                ],
            );

            match inserted {
                Ok(_) => Ok(todo),
                Err(err) if is_primary_key_violation(&err) => Err(StoreError::Duplicate(todo.id)),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM todos ORDER BY created_at DESC, rowid ASC"
            ))?;

            let todos = stmt
                .query_map([], todo_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(todos)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM todos WHERE id = ?1"),
                    params![id.to_string()],
                    todo_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn update(&self, id: Uuid, todo: Todo) -> Result<Option<Todo>, StoreError> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                r#"
                UPDATE todos
                SET title = ?2, description = ?3, completed = ?4, created_at = ?5, updated_at = ?6
                WHERE id = ?1
                "#,
                params![
                    id.to_string(),
                    todo.title,
                    todo.description,
                    todo.completed,
                    timestamp(&todo.created_at),
                    timestamp(&todo.updated_at),
                ],
            )?;

            Ok((changed > 0).then_some(todo))
        })
        .await
    }

    async fn remove(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    &format!("DELETE FROM todos WHERE id = ?1 RETURNING {COLUMNS}"),
                    params![id.to_string()],
                    todo_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?)
        })
            .await
    }

    async fn load(&self) -> Result<(), StoreError> {
        let count = self.count().await?;
        info!(count, "opened todo table");
        Ok(())
    }
}

/// Fixed-width UTC form, so text ordering matches time ordering.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error()
        .is_some_and(|err| err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: parse_text(row, 0, Uuid::parse_str)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        created_at: parse_text(row, 4, parse_timestamp)?,
        updated_at: parse_text(row, 5, parse_timestamp)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc))
}

fn parse_text<T, E>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    parse(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}
