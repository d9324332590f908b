use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::TrainingError;

/// Sink for failures that are reported to callers but do not stop the runtime.
pub trait ExceptionLogger: Send + Sync {
    fn log_non_fatal(&self, error: &TrainingError, at: DateTime<Utc>);
}

/// Forwards non-fatal failures to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExceptionLogger;

impl ExceptionLogger for TracingExceptionLogger {
    fn log_non_fatal(&self, error: &TrainingError, at: DateTime<Utc>) {
        tracing::warn!(%error, at = %at.to_rfc3339(), "training request failed");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedException {
    pub error: TrainingError,
    pub logged_at: DateTime<Utc>,
}

/// Keeps every logged failure in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExceptionLogger {
    entries: Arc<Mutex<Vec<LoggedException>>>,
}

impl InMemoryExceptionLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<LoggedException> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn most_recent(&self) -> Option<LoggedException> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl ExceptionLogger for InMemoryExceptionLogger {
    fn log_non_fatal(&self, error: &TrainingError, at: DateTime<Utc>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LoggedException {
                error: error.clone(),
                logged_at: at,
            });
    }
}
