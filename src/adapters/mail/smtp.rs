use super::build_message;
use crate::config::SmtpTls;
use crate::domain::identity::SenderIdentity;
use crate::domain::template::RenderedMessage;
use crate::services::mailer::{DeliveryError, MailDispatcher};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub enum SmtpAuthMode {
    /// SASL XOAUTH2 as the sender, using the caller's access token.
    Xoauth2,
    Password { username: String, password: String },
}

impl fmt::Debug for SmtpAuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xoauth2 => f.write_str("Xoauth2"),
            Self::Password { username, .. } => {
                f.debug_struct("Password").field("username", username).finish_non_exhaustive()
            }
        }
    }
}

/// Opens one SMTP session per message.
#[derive(Debug, Clone)]
pub struct SmtpDispatcher {
    host: String,
    port: u16,
    tls: SmtpTls,
    auth: SmtpAuthMode,
    timeout: Duration,
}

impl SmtpDispatcher {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, tls: SmtpTls, auth: SmtpAuthMode, timeout: Duration) -> Self {
        Self { host: host.into(), port, tls, auth, timeout }
    }

    fn credentials(&self, sender: &SenderIdentity, credential: &str) -> (Credentials, Vec<Mechanism>) {
        match &self.auth {
            SmtpAuthMode::Xoauth2 => {
                (Credentials::new(sender.email.clone(), credential.to_string()), vec![Mechanism::Xoauth2])
            }
            SmtpAuthMode::Password { username, password } => {
                (Credentials::new(username.clone(), password.clone()), vec![Mechanism::Plain, Mechanism::Login])
            }
        }
    }

    fn transport(
        &self,
        sender: &SenderIdentity,
        credential: &str,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let (credentials, mechanisms) = self.credentials(sender, credential);
        let builder = match self.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host).map_err(DeliveryError::new)?,
            SmtpTls::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host).map_err(DeliveryError::new)?
            }
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
        };
        Ok(builder
            .port(self.port)
            .credentials(credentials)
            .authentication(mechanisms)
            .timeout(Some(self.timeout))
            .build())
    }
}

#[async_trait]
impl MailDispatcher for SmtpDispatcher {
    #[tracing::instrument(err(level = "debug"), skip_all, fields(recipient = %recipient, host = %self.host))]
    async fn dispatch(
        &self,
        credential: &str,
        sender: &SenderIdentity,
        recipient: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError> {
        let mime = build_message(sender, recipient, message)?;
        let transport = self.transport(sender, credential)?;

        let response = transport.send(mime).await.map_err(DeliveryError::new)?;
        tracing::debug!(reply = response.first_word().unwrap_or_default(), "Message accepted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
