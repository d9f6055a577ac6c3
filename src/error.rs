use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Errors surfaced by the intake routes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Validation(message) => message.clone(),
            Self::Internal(_) => {
                error!("Webhook handler error: {}", self);
                "Internal server error".to_string()
            }
        };

        (
            status,
            Json(json!({
                "success": false,
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Failures placing an outbound call with the voice provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Vapi API error: {message} (status {status})")]
    Api { status: u16, message: String },

    #[error("request to call provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("call provider is not configured: {0}")]
    Configuration(String),
}
