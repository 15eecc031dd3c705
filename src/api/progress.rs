use crate::services::batch_service::BatchRun;
use axum::{
    body::Body,
    http::{HeaderName, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use tokio::sync::watch;

/// Streams a batch as `text/event-stream`. Rows are only processed while the
/// client keeps reading; the stream also ends early once shutdown is signalled.
pub fn event_stream(run: BatchRun, mut shutdown_rx: watch::Receiver<bool>) -> Response {
    let shutdown = async move {
        let closed = shutdown_rx.wait_for(|&stop| stop).await.is_err();
        if closed {
            // Sender gone without a signal: never interrupt.
            std::future::pending::<()>().await;
        }
        tracing::info!("Closing progress stream for shutdown");
    };

    let frames = run
        .into_stream()
        .take_until(shutdown)
        .map(|event| Ok::<_, Infallible>(Bytes::from(event.to_frame())));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}
