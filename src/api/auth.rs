use crate::api::AppState;
use crate::api::schemas::auth::{AuthSession as AuthSessionSchema, CodeExchange, User};
use crate::domain::identity::AuthSession;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};

pub async fn exchange_code(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    payload: std::result::Result<Json<CodeExchange>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let session = state.auth_service.login(&provider, &payload.code).await?;
    Ok(Json(map_session(session)))
}

fn map_session(session: AuthSession) -> AuthSessionSchema {
    AuthSessionSchema {
        user: User { name: session.user.name, email: session.user.email },
        access_token: session.access_token,
    }
}
