use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Custom error type for the application
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound,
    InternalServerError {
        message: String,
        traceback: Option<String>,
    },
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl AppError {
    /// 500 that tells the client only the error message
    pub fn internal(err: anyhow::Error) -> Self {
        error!("Request failed: {:?}", err);
        AppError::InternalServerError {
            message: format!("{:#}", err),
            traceback: None,
        }
    }

    /// 500 that also hands the full cause chain back to the client
    pub fn with_traceback(err: anyhow::Error) -> Self {
        let traceback = format!("{:?}", err);
        error!("Request failed: {}", traceback);
        AppError::InternalServerError {
            message: format!("{:#}", err),
            traceback: Some(traceback),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, traceback) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string(), None),
            AppError::InternalServerError { message, traceback } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, traceback)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
            traceback,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

/// Result type for application handlers
pub type AppResult<T> = Result<T, AppError>;
