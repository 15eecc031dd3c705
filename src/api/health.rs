use crate::api::schemas::health::PingResponse;
use axum::{Json, response::IntoResponse};

/// Liveness probe: returns `{"message": "pong"}` as long as the server is running.
pub async fn ping() -> impl IntoResponse {
    Json(PingResponse { message: "pong".to_string() })
}
