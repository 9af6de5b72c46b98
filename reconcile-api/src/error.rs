use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reconcile_store::StoreError;
use reconcile_workflow::WorkflowError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Workflow(WorkflowError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(WorkflowError::Store(StoreError::NotFound { .. })) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Workflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
