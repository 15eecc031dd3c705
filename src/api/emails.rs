use crate::api::AppState;
use crate::api::middleware::BearerToken;
use crate::api::progress;
use crate::api::schemas::emails::SendEmailsForm;
use crate::error::{AppError, Result};
use crate::services::batch_service::SendJob;
use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Response,
};

/// Validates the request up front, then streams one progress frame per CSV row.
pub async fn send_emails(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let sender = state.auth_service.resolve_sender(&token).await.map_err(AppError::InvalidCredential)?;

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (rows, template) = SendEmailsForm::read(multipart).await?.into_job_parts()?;

    let run = state.batch_service.start(SendJob { rows, template, sender, credential: token });
    Ok(progress::event_stream(run, state.shutdown_rx.clone()))
}
