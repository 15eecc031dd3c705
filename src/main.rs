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

use mass_mailer::config::Config;
use mass_mailer::telemetry;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    mass_mailer::setup_panic_hook();

    let boot_span = tracing::info_span!("boot_server");
    let (listener, app_router, shutdown_rx) = async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        mass_mailer::spawn_signal_handler(shutdown_tx);

        let services = mass_mailer::build_services(&config)?;
        let app_router = mass_mailer::api::app_router(&config, services, shutdown_rx.clone());

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "listening");

        Ok::<(tokio::net::TcpListener, axum::Router, watch::Receiver<bool>), anyhow::Error>((
            listener,
            app_router,
            shutdown_rx,
        ))
    }
    .instrument(boot_span)
    .await?;

    let mut server_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown(async move {
            let _ = server_rx.wait_for(|&s| s).await;
        });

    // Progress streams end on the same signal; bound how long they may take to drain.
    let mut timeout_rx = shutdown_rx.clone();
    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    tokio::select! {
        result = server.into_future() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = async {
            let _ = timeout_rx.wait_for(|&s| s).await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            tracing::warn!("Timeout waiting for open connections to close.");
        }
    }

    tracing::info!("Shutdown complete");
    telemetry_guard.shutdown();
    Ok(())
}
