use crate::domain::identity::SenderIdentity;
use crate::domain::template::RenderedMessage;
use async_trait::async_trait;
use thiserror::Error;

/// A failed delivery attempt. Carries the underlying cause's message only; the
/// batch treats every transport failure the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeliveryError(String);

impl DeliveryError {
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

#[async_trait]
pub trait MailDispatcher: Send + Sync + std::fmt::Debug {
    /// Makes exactly one attempt to deliver `message` to `recipient` as `sender`.
    ///
    /// `credential` is the caller's OAuth2 access token; transports that
    /// authenticate with static credentials may ignore it.
    ///
    /// # Errors
    /// Returns `DeliveryError` for invalid addresses, network failures,
    /// non-2xx API responses and SMTP protocol errors alike.
    async fn dispatch(
        &self,
        credential: &str,
        sender: &SenderIdentity,
        recipient: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError>;

    fn name(&self) -> &'static str;
}
