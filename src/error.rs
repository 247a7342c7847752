use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

/// Errors produced by the proxy server. Each one renders as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid prompt")]
    InvalidPrompt,

    #[error("Server API key not configured")]
    MissingCredential,

    #[error("API Error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream request timed out after {0}s")]
    UpstreamTimeout(u64),

    /// Detail is logged, never sent to the client.
    #[error("Server error")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPrompt => StatusCode::BAD_REQUEST,
            AppError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => tracing::error!(%detail, "proxy request failed"),
            AppError::Upstream { status, .. } => {
                tracing::warn!(status, error = %self, "upstream returned an error")
            }
            _ => tracing::warn!(error = %self, "proxy request rejected"),
        }

        response::error(self.status(), self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Internal(err.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
