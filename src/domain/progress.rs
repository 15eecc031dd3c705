use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Sent { first_name: String, email: String },
    Failed { reason: String },
}

/// The result of processing one CSV row. `index` is 1-based and counts every
/// data row, valid or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub index: usize,
    pub status: RowStatus,
}

impl RowOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, RowStatus::Sent { .. })
    }
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            RowStatus::Sent { first_name, email } => {
                write!(f, "{}. Success: Name: {first_name}, Email: {email}", self.index)
            }
            RowStatus::Failed { reason } => write!(f, "{}. Failed: {reason}", self.index),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub const fn record(&mut self, outcome: &RowOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded > 0 {
            write!(f, "\nFinished sending emails. \nSuccess: {}, Failures: {}", self.succeeded, self.failed)
        } else {
            write!(f, "\nFailed to send all {} emails.", self.failed)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Row(RowOutcome),
    Finished(BatchSummary),
}

impl ProgressEvent {
    /// Encodes the event as a single `text/event-stream` frame.
    #[must_use]
    pub fn to_frame(&self) -> String {
        match self {
            Self::Row(outcome) => format!("data: {outcome}\n\n"),
            Self::Finished(summary) => format!("data: {summary}\n\n"),
        }
    }
}
