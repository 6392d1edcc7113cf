use aliases_core::AliasError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Alias(#[from] AliasError),
    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    Decode(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Alias(err) => match err {
                AliasError::Validation(_) | AliasError::EmptyAlias(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AliasError::NotFound(_) => StatusCode::NOT_FOUND,
                AliasError::AlreadyExists(_) => StatusCode::CONFLICT,
                AliasError::MaxAttemptsReached { .. } | AliasError::Store(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                AliasError::CorruptDefinition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Errors the caller can fix by changing the request; logged at `warn`.
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::Decode(_) => true,
            AppError::Alias(err) => err.is_client_error(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if self.is_client_error() {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        } else {
            error!(status = status.as_u16(), error = %message, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
