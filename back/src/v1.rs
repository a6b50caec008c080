use std::sync::Arc;

use api::v1::{Success, Todo};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, Method, StatusCode, Uri},
    routing::{get, patch},
    Json, Router,
};
use serde_json::Value;

use crate::{error::ApiError, AppState};

const TODO_CREATED: &str = "Todo created successfully";
const TODO_RETRIEVED: &str = "Todo retrieved successfully";
const TODOS_RETRIEVED: &str = "Todos retrieved successfully";
const NO_TODOS_FOUND: &str = "No todos found";
const TODO_UPDATED: &str = "Todo updated successfully";
const TODO_DELETED: &str = "Todo deleted successfully";
const TODO_TOGGLED: &str = "Todo toggled successfully";

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/todos",
            get(get_todos).post(add_todo).fallback(method_not_allowed),
        )
        .route(
            "/todos/:id",
            get(get_todo)
                .put(replace_todo)
                .patch(patch_todo)
                .delete(delete_todo)
                .fallback(method_not_allowed),
        )
        .route(
            "/todos/:id/toggle",
            patch(toggle_todo).fallback(method_not_allowed),
        )
}

/// A request body parsed as arbitrary JSON, leaving shape checks to validation.
///
/// An empty body reads as `{}`.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::InvalidJson)?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Value::Object(Default::default())));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|_| ApiError::InvalidJson)
    }
}

/// The `:id` path segment. A segment that does not decode cannot name a todo,
/// so it is answered like any other unknown id.
pub struct TodoId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(_) => {
                let raw = parts.uri.path().split('/').nth(2).unwrap_or_default();
                Err(ApiError::TodoNotFound(raw.to_owned()))
            }
        }
    }
}

fn found(todo: Option<Todo>, id: String, message: &str) -> ApiResult<Todo> {
    let todo = todo.ok_or(ApiError::TodoNotFound(id))?;
    Ok(Json(Success::new(todo, message)))
}

async fn get_todos(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Todo>> {
    let list = state.service.get_all().await?;

    let message = if list.count > 0 {
        TODOS_RETRIEVED
    } else {
        NO_TODOS_FOUND
    };

    Ok(Json(Success::new(list.todos, message).with_count(list.count)))
}

async fn add_todo(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody,
) -> Result<(StatusCode, Json<Success<Todo>>), ApiError> {
    let todo = state.service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(Success::new(todo, TODO_CREATED))))
}

async fn get_todo(State(state): State<Arc<AppState>>, TodoId(id): TodoId) -> ApiResult<Todo> {
    let todo = state.service.get_by_id(&id).await?;
    found(todo, id, TODO_RETRIEVED)
}

async fn replace_todo(
    State(state): State<Arc<AppState>>,
    TodoId(id): TodoId,
    JsonBody(input): JsonBody,
) -> ApiResult<Todo> {
    let todo = state.service.full_update(&id, &input).await?;
    found(todo, id, TODO_UPDATED)
}

async fn patch_todo(
    State(state): State<Arc<AppState>>,
    TodoId(id): TodoId,
    JsonBody(input): JsonBody,
) -> ApiResult<Todo> {
    let todo = state.service.partial_update(&id, &input).await?;
    found(todo, id, TODO_UPDATED)
}

async fn toggle_todo(State(state): State<Arc<AppState>>, TodoId(id): TodoId) -> ApiResult<Todo> {
    let todo = state.service.toggle(&id).await?;
    found(todo, id, TODO_TOGGLED)
}

async fn delete_todo(State(state): State<Arc<AppState>>, TodoId(id): TodoId) -> ApiResult<Todo> {
    let todo = state.service.remove(&id).await?;
    found(todo, id, TODO_DELETED)
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        path: uri.path().to_owned(),
    }
}

pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method,
        path: uri.path().to_owned(),
    }
}
