use crate::corpus::{IdError, TokenError};
use crate::import::ImportError;
use crate::query::QueryError;
use crate::repository::RepositoryError;
use crate::stats_store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

/// JSON error reply: `{"error": "..."}` plus whatever details the failure carries.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new<M: ToString>(status: StatusCode, message: M) -> Self {
        Self {
            status,
            body: json!({ "error": message.to_string() }),
        }
    }

    pub fn bad_request<M: ToString>(message: M) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}: {}", self.status, self.body);
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::bad_request(err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::bad_request(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidId(_) => StatusCode::BAD_REQUEST,
            StoreError::Malformed { .. } | StoreError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let status = match &err {
            RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
            RepositoryError::AlreadyExists(_) | RepositoryError::DuplicateEpisode(_) => {
                StatusCode::CONFLICT
            }
            RepositoryError::InvalidPath(_) | RepositoryError::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            RepositoryError::Malformed { .. } | RepositoryError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Scope(_) | QueryError::NoTokens => ApiError::bad_request(err),
            QueryError::Store(err) => err.into(),
            QueryError::Repository(err) => err.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::AlreadyExists(_) => ApiError::new(StatusCode::CONFLICT, err),
            ImportError::Source(_) => ApiError::new(StatusCode::BAD_GATEWAY, err),
            ImportError::Incomplete { ref summary } => ApiError {
                status: StatusCode::BAD_GATEWAY,
                body: json!({
                    "error": err.to_string(),
                    "fetch_failures": summary.fetch_failures,
                    "analysis_failures": summary.analysis_failures,
                }),
            },
            ImportError::Repository(_) | ImportError::Store(_) | ImportError::Join(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err)
            }
        }
    }
}
