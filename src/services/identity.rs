use crate::domain::identity::SenderIdentity;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),
    #[error("{0}")]
    Exchange(String),
    #[error("{0}")]
    Profile(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Path segment under `/auth/` that selects this provider.
    fn name(&self) -> &'static str;

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    /// Returns `AuthError::Exchange` if the provider rejects the code or is unreachable.
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError>;

    /// Looks up the profile behind an access token.
    ///
    /// # Errors
    /// Returns `AuthError::Profile` if the token is rejected or the response is unusable.
    async fn fetch_profile(&self, access_token: &str) -> Result<SenderIdentity, AuthError>;
}
