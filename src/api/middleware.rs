use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::fmt;

/// The caller's OAuth access token, taken verbatim from `Authorization: Bearer <token>`.
pub struct BearerToken(pub String);

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::MissingBearer)?;
        let auth_str = auth_header.to_str().map_err(|_| AppError::MissingBearer)?;

        let token = auth_str.strip_prefix("Bearer ").map(str::trim).ok_or(AppError::MissingBearer)?;
        if token.is_empty() {
            return Err(AppError::MissingBearer);
        }

        Ok(Self(token.to_string()))
    }
}
