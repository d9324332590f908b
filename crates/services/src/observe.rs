//! Observable results delivered by the training runtime.
//!
//! A [`DataProvider`] holds the latest [`AsyncResult`] of some operation and
//! fans every new value out to its subscribers. Subscribing replays the latest
//! value first, then delivers each later value in publish order.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::TrainingError;

//
// ─── ASYNC RESULT ──────────────────────────────────────────────────────────────
//

/// Three-state result of an asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncResult<T> {
    Pending,
    Success(T),
    Failure(TrainingError),
}

impl<T> AsyncResult<T> {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    #[must_use]
    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&TrainingError> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, TrainingError>> for AsyncResult<T> {
    fn from(result: Result<T, TrainingError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err),
        }
    }
}

//
// ─── DATA PROVIDER ─────────────────────────────────────────────────────────────
//

struct Shared<T> {
    latest: AsyncResult<T>,
    subscribers: Vec<UnboundedSender<AsyncResult<T>>>,
}

/// Replay-latest, in-order observable value.
pub struct DataProvider<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Clone for DataProvider<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> DataProvider<T> {
    pub(crate) fn new(initial: AsyncResult<T>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                latest: initial,
                subscribers: Vec::new(),
            })),
        }
    }

    pub(crate) fn pending() -> Self {
        Self::new(AsyncResult::Pending)
    }

    /// Replace the latest value and deliver it to every live subscriber.
    pub(crate) fn publish(&self, value: AsyncResult<T>) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
        shared.latest = value;
    }

    /// Most recently published value.
    #[must_use]
    pub fn latest(&self) -> AsyncResult<T> {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// Start observing. The latest value is delivered first.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if tx.send(shared.latest.clone()).is_ok() {
            shared.subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Wait until the provider settles on a success or failure.
    ///
    /// # Errors
    ///
    /// Returns the published `TrainingError`, or `RuntimeUnavailable` if the
    /// provider can no longer change.
    pub async fn wait_for_result(&self) -> Result<T, TrainingError> {
        let mut subscription = self.subscribe();
        loop {
            match subscription.next().await {
                Some(AsyncResult::Success(value)) => return Ok(value),
                Some(AsyncResult::Failure(err)) => return Err(err),
                Some(AsyncResult::Pending) => {}
                None => return Err(TrainingError::RuntimeUnavailable),
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DataProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DataProvider")
            .field("latest", &shared.latest)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

/// Ordered stream of values published to one `DataProvider`.
pub struct Subscription<T> {
    rx: UnboundedReceiver<AsyncResult<T>>,
}

impl<T> Subscription<T> {
    /// Next value, waiting for one to be published.
    pub async fn next(&mut self) -> Option<AsyncResult<T>> {
        self.rx.recv().await
    }

    /// Next value if one is already queued.
    pub fn try_next(&mut self) -> Option<AsyncResult<T>> {
        self.rx.try_recv().ok()
    }

    /// Every value queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<AsyncResult<T>> {
        let mut values = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            values.push(value);
        }
        values
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

//
// ─── REPLY ─────────────────────────────────────────────────────────────────────
//

/// Write side of a one-shot operation result.
///
/// A reply that is dropped before being resolved (the runtime went away or
/// never received the command) publishes `RuntimeUnavailable`.
pub(crate) struct Reply<T: Clone> {
    provider: DataProvider<T>,
    resolved: bool,
}

impl<T: Clone> Reply<T> {
    pub(crate) fn channel() -> (Self, DataProvider<T>) {
        let provider = DataProvider::pending();
        let reply = Self {
            provider: provider.clone(),
            resolved: false,
        };
        (reply, provider)
    }

    pub(crate) fn resolve(mut self, result: Result<T, TrainingError>) {
        self.resolved = true;
        self.provider.publish(result.into());
    }
}

impl<T: Clone> Drop for Reply<T> {
    fn drop(&mut self) {
        if !self.resolved {
            self.provider
                .publish(AsyncResult::Failure(TrainingError::RuntimeUnavailable));
        }
    }
}

impl<T: Clone> fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}
