//! Dashboard API errors, rendered as `{"error": "..."}`

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::data::DataError;
use crate::models::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Request is valid but there is not enough data to answer it
    #[error("{0}")]
    Unprocessable(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InsufficientData { .. } | ModelError::NotTrained => AppError::Unprocessable(e.to_string()),
            ModelError::InvalidConfig(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        // Pipeline errors arrive wrapped in context; keep the root cause's status
        match e.downcast::<ModelError>() {
            Ok(model_error) => model_error.into(),
            Err(e) => match e.downcast::<DataError>() {
                Ok(data_error) => AppError::Data(data_error),
                Err(e) => AppError::Internal(format!("{:#}", e)),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Data(DataError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppError::Data(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Dashboard request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_map_to_client_statuses() {
        let err: AppError = ModelError::InsufficientData { needed: 2, got: 0 }.into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let wrapped = anyhow::Error::new(ModelError::NotTrained).context("predicting");
        let err: AppError = wrapped.into();
        assert!(matches!(err, AppError::Unprocessable(_)));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err: AppError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::Data(DataError::validation_error("year", "out of range"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
