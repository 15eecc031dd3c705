use crate::services::identity::AuthError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Request-fatal errors, surfaced before any progress is streamed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing or invalid Authorization header")]
    MissingBearer,
    #[error("Authentication failed: {0}")]
    AuthFailed(#[from] AuthError),
    #[error("Authentication failed: {0}")]
    InvalidCredential(AuthError),
    #[error("{0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingBearer => {
                tracing::debug!("Missing or malformed bearer token");
                StatusCode::UNAUTHORIZED
            }
            Self::AuthFailed(e) => {
                tracing::warn!(error = %e, "Code exchange failed");
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredential(e) => {
                tracing::warn!(error = %e, "Bearer token rejected by identity provider");
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                StatusCode::BAD_REQUEST
            }
        };

        let body = Json(json!({
            "detail": self.to_string()
        }));

        (status, body).into_response()
    }
}
