pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod validation;
mod v1;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::Request,
    http::{header, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{service::TodoService, store::TodoStore};

pub struct AppState {
    pub service: TodoService,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self {
            service: TodoService::new(store),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(v1::router())
        .fallback(v1::route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors())
                .layer(middleware::from_fn(log_request)),
        )
        .with_state(state)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    Flushed,
    Failed,
    TimedOut,
}

/// Persists the store at shutdown, giving up after `timeout`.
pub async fn flush_store(store: &dyn TodoStore, timeout: Duration) -> FlushOutcome {
    match tokio::time::timeout(timeout, store.flush()).await {
        Ok(Ok(())) => {
            info!("cleanup completed");
            FlushOutcome::Flushed
        }
        Ok(Err(err)) => {
            error!(%err, "failed to flush store");
            FlushOutcome::Failed
        }
        Err(_) => {
            error!(?timeout, "store flush timed out");
            FlushOutcome::TimedOut
        }
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "handled request"
    );

    response
}
