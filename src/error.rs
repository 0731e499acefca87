//! Typed errors returned by scheduling operations

use crate::db::RepositoryError;
use crate::models::ApiResponse;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Pastor not found")]
    PastorNotFound,

    #[error("Slot overlaps an existing slot on the same day")]
    Conflict,

    #[error("Not found or already processed")]
    NotFoundOrAlreadyProcessed,

    #[error("Storage failure: {0}")]
    DependencyFailure(#[source] RepositoryError),
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict => SchedulingError::Conflict,
            other => SchedulingError::DependencyFailure(other),
        }
    }
}

impl SchedulingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SchedulingError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SchedulingError::Forbidden => StatusCode::FORBIDDEN,
            SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulingError::PastorNotFound => StatusCode::NOT_FOUND,
            SchedulingError::Conflict => StatusCode::CONFLICT,
            SchedulingError::NotFoundOrAlreadyProcessed => StatusCode::NOT_FOUND,
            SchedulingError::DependencyFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let message = match &self {
            SchedulingError::DependencyFailure(e) => {
                tracing::error!("Storage error: {}", e);
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        (self.status_code(), Json(ApiResponse::<()>::error(message))).into_response()
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
