pub mod auth_service;
pub mod batch_service;
pub mod identity;
pub mod mailer;
