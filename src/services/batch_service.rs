use crate::domain::identity::SenderIdentity;
use crate::domain::progress::{BatchSummary, ProgressEvent, RowOutcome, RowStatus};
use crate::domain::recipient::{CsvRow, Recipient, ValidationError};
use crate::domain::template::{EmailTemplate, TemplateFormatError};
use crate::services::mailer::{DeliveryError, MailDispatcher};
use futures::{FutureExt, Stream};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

#[derive(Error, Debug)]
enum RowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Template(#[from] TemplateFormatError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("Unexpected error while sending")]
    Unexpected,
}

#[derive(Clone, Debug)]
struct Metrics {
    emails: Counter<u64>,
    batches: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("mass-mailer");
        Self {
            emails: meter
                .u64_counter("mailer_emails_sent_total")
                .with_description("Total delivery attempts by outcome")
                .build(),
            batches: meter
                .u64_counter("mailer_batches_total")
                .with_description("Total batches by how they ended")
                .build(),
        }
    }
}

/// Everything one `/send-emails` request needs to run its batch.
pub struct SendJob {
    pub rows: Vec<Result<CsvRow, ValidationError>>,
    pub template: EmailTemplate,
    pub sender: SenderIdentity,
    pub credential: String,
}

impl fmt::Debug for SendJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendJob")
            .field("rows", &self.rows.len())
            .field("template", &self.template)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct BatchService {
    dispatcher: Arc<dyn MailDispatcher>,
    metrics: Metrics,
}

impl BatchService {
    #[must_use]
    pub fn new(dispatcher: Arc<dyn MailDispatcher>) -> Self {
        Self { dispatcher, metrics: Metrics::new() }
    }

    /// Prepares a batch. Nothing is sent until events are pulled from the returned run.
    #[must_use]
    pub fn start(&self, job: SendJob) -> BatchRun {
        let span = tracing::info_span!(
            "batch",
            rows = job.rows.len(),
            sender = %job.sender.email,
            transport = self.dispatcher.name(),
        );
        span.in_scope(|| tracing::info!("Batch accepted"));

        BatchRun {
            rows: job.rows.into_iter().enumerate(),
            template: job.template,
            sender: job.sender,
            credential: job.credential,
            dispatcher: Arc::clone(&self.dispatcher),
            summary: BatchSummary::default(),
            finished: false,
            metrics: self.metrics.clone(),
            span,
        }
    }
}

/// A lazily driven batch: each call to [`BatchRun::next_event`] processes at
/// most one row. Dropping the run before it finishes abandons the remaining
/// rows; a run cannot be restarted.
pub struct BatchRun {
    rows: std::iter::Enumerate<std::vec::IntoIter<Result<CsvRow, ValidationError>>>,
    template: EmailTemplate,
    sender: SenderIdentity,
    credential: String,
    dispatcher: Arc<dyn MailDispatcher>,
    summary: BatchSummary,
    finished: bool,
    metrics: Metrics,
    span: tracing::Span,
}

impl fmt::Debug for BatchRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRun")
            .field("summary", &self.summary)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl BatchRun {
    /// Processes the next row and returns its outcome, then the summary once
    /// every row is done, then `None`.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }

        let Some((position, row)) = self.rows.next() else {
            self.finished = true;
            self.metrics.batches.add(1, &[KeyValue::new("outcome", "completed")]);
            self.span.in_scope(|| {
                tracing::info!(succeeded = self.summary.succeeded, failed = self.summary.failed, "Batch finished");
            });
            return Some(ProgressEvent::Finished(self.summary));
        };

        if position > 0 {
            tokio::task::yield_now().await;
        }

        let index = position + 1;
        let span = tracing::debug_span!(parent: &self.span, "row", row = index);
        let status = match self.process_row(row).instrument(span).await {
            Ok(recipient) => {
                self.metrics.emails.add(1, &[KeyValue::new("status", "success")]);
                RowStatus::Sent { first_name: recipient.first_name().to_string(), email: recipient.email().to_string() }
            }
            Err(e) => {
                self.metrics.emails.add(1, &[KeyValue::new("status", "failure")]);
                RowStatus::Failed { reason: e.to_string() }
            }
        };

        let outcome = RowOutcome { index, status };
        self.summary.record(&outcome);
        Some(ProgressEvent::Row(outcome))
    }

    async fn process_row(&self, row: Result<CsvRow, ValidationError>) -> Result<Recipient, RowError> {
        let result = async {
            let recipient = Recipient::from_row(&row?)?;
            let message = self.template.render(recipient.first_name())?;

            let attempt = self.dispatcher.dispatch(&self.credential, &self.sender, recipient.email(), &message);
            AssertUnwindSafe(attempt).catch_unwind().await.map_err(|_| RowError::Unexpected)??;

            Ok::<_, RowError>(recipient)
        }
        .await;

        match &result {
            Ok(recipient) => tracing::debug!(email = %recipient.email(), "Row sent"),
            Err(e) => tracing::debug!(error = %e, "Row failed"),
        }
        result
    }

    /// Adapts the run into a stream of events, one row per poll.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send {
        futures::stream::unfold(self, |mut run| async move { run.next_event().await.map(|event| (event, run)) })
    }
}

impl Drop for BatchRun {
    fn drop(&mut self) {
        if !self.finished {
            self.metrics.batches.add(1, &[KeyValue::new("outcome", "cancelled")]);
            self.span.in_scope(|| {
                tracing::info!(
                    succeeded = self.summary.succeeded,
                    failed = self.summary.failed,
                    "Batch abandoned before completion"
                );
            });
        }
    }
}
