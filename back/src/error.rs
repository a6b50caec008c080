use api::v1::{ErrorCode, Failure};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::{service::ServiceError, store::StoreError, validation::ValidationError};

/// Every failure the HTTP boundary can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Todo not found with id: {0}")]
    TodoNotFound(String),
    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: Method, path: String },
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Internal server error")]
    Internal(#[source] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::TodoNotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::TodoNotFound(_) | Self::RouteNotFound { .. } => ErrorCode::NotFound,
            Self::MethodNotAllowed { .. } => ErrorCode::MethodNotAllowed,
            Self::InvalidJson => ErrorCode::InvalidJson,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(err) => Self::Validation(err),
            ServiceError::Store(err) => Self::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(err) = &self {
            error!(%err, "request failed");
            debug!(?err, "request failure detail");
        }

        let body = Failure::new(self.code(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_detail() {
        let err = ApiError::Internal(StoreError::Io(std::io::Error::other("disk on fire")));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn service_errors_map_to_boundary_errors() {
        let err = ApiError::from(ServiceError::Validation(ValidationError::TitleEmpty));

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.to_string(), "Title cannot be empty");
    }
}
