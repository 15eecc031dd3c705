pub mod gmail;
pub mod smtp;

pub use gmail::GmailApiDispatcher;
pub use smtp::{SmtpAuthMode, SmtpDispatcher};

use crate::domain::identity::SenderIdentity;
use crate::domain::template::{ContentKind, RenderedMessage};
use crate::services::mailer::DeliveryError;
use lettre::message::{Mailbox, header::ContentType};
use lettre::{Address, Message};

/// Builds the RFC 5322 message shared by every transport.
pub(crate) fn build_message(
    sender: &SenderIdentity,
    recipient: &str,
    message: &RenderedMessage,
) -> Result<Message, DeliveryError> {
    let from_address: Address = sender
        .email
        .parse()
        .map_err(|e| DeliveryError::new(format!("Invalid sender address '{}': {e}", sender.email)))?;
    let to_address: Address =
        recipient.parse().map_err(|e| DeliveryError::new(format!("Invalid recipient address '{recipient}': {e}")))?;

    let display_name = Some(sender.name.trim()).filter(|name| !name.is_empty()).map(str::to_string);
    let content_type = match message.kind {
        ContentKind::Plain => ContentType::TEXT_PLAIN,
        ContentKind::Html => ContentType::TEXT_HTML,
    };

    Message::builder()
        .from(Mailbox::new(display_name, from_address))
        .to(Mailbox::new(None, to_address))
        .subject(message.subject.clone())
        .header(content_type)
        .body(message.body.clone())
        .map_err(DeliveryError::new)
}
