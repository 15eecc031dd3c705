#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use crate::adapters::identity::GoogleIdentityProvider;
use crate::adapters::mail::{GmailApiDispatcher, SmtpAuthMode, SmtpDispatcher};
use crate::api::ServiceContainer;
use crate::config::{Config, MailConfig, MailTransport, SmtpAuth};
use crate::services::auth_service::AuthService;
use crate::services::batch_service::BatchService;
use crate::services::mailer::MailDispatcher;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

/// Wires the configured identity provider and mail transport into the services.
///
/// # Errors
/// Returns an error if an endpoint URL is invalid, an HTTP client cannot be
/// built, or password SMTP auth is selected without credentials.
pub fn build_services(config: &Config) -> anyhow::Result<ServiceContainer> {
    let provider = Arc::new(GoogleIdentityProvider::new(&config.oauth).context("invalid OAuth configuration")?);
    let dispatcher = mail_dispatcher(&config.mail)?;
    tracing::info!(transport = dispatcher.name(), provider = "google", "Services configured");

    Ok(ServiceContainer {
        auth_service: AuthService::new(provider),
        batch_service: BatchService::new(dispatcher),
    })
}

fn mail_dispatcher(config: &MailConfig) -> anyhow::Result<Arc<dyn MailDispatcher>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.transport {
        MailTransport::GmailApi => Ok(Arc::new(
            GmailApiDispatcher::new(config.gmail_send_url.clone(), timeout).context("failed to build HTTP client")?,
        )),
        MailTransport::Smtp => {
            let auth = match config.smtp_auth {
                SmtpAuth::Xoauth2 => SmtpAuthMode::Xoauth2,
                SmtpAuth::Password => SmtpAuthMode::Password {
                    username: config.smtp_username.clone().context("MAILER_SMTP_USERNAME is required")?,
                    password: config.smtp_password.clone().context("MAILER_SMTP_PASSWORD is required")?,
                },
            };
            Ok(Arc::new(SmtpDispatcher::new(
                config.smtp_host.clone(),
                config.smtp_port,
                config.smtp_tls,
                auth,
                timeout,
            )))
        }
    }
}

/// Routes panics through tracing so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        let location = panic_info.location().map(ToString::to_string).unwrap_or_default();

        tracing::error!(panic.message = %message, panic.location = %location, "Panic occurred");
    }));
}

/// Flips `shutdown_tx` to `true` on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}
