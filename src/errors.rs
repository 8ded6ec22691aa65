use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Invalid data")]
    InvalidShape,

    #[error("{0}")]
    InvalidIntent(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to save")]
    BackendUnavailable(#[source] std::io::Error),
}

impl AppError {
    pub fn invalid_intent(message: impl Into<String>) -> Self {
        Self::InvalidIntent(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidShape | Self::InvalidIntent(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BackendUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::BackendUnavailable(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
