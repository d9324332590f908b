//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by an `AnswerClassifier`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassifierError {
    #[error("answer {answer} cannot be evaluated by a {interaction} interaction")]
    IncompatibleAnswer {
        interaction: &'static str,
        answer: String,
    },
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

/// Errors published by the training controllers.
///
/// Every variant is cloneable so one failure can be delivered to every
/// observer of a provider and to the exception logger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrainingError {
    #[error("Expected at least 1 question")]
    InvalidRequest,
    #[error("Cannot start a new training session until the previous one is completed.")]
    SessionAlreadyActive,
    #[error("{0}")]
    NoActiveSession(&'static str),
    #[error("Cannot navigate to next state; at most recent state.")]
    IllegalNavigation,
    #[error("Cannot submit an answer after the training session has finished.")]
    SessionFinished,
    #[error("Question {0} is not the current question.")]
    QuestionNotCurrent(String),
    #[error("Hint index {index} is out of range for a question with {count} hints.")]
    HintIndexOutOfRange { index: usize, count: usize },
    #[error("Question {0} has no solution.")]
    NoSolution(String),
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("the training runtime is no longer running")]
    RuntimeUnavailable,
}

impl From<StorageError> for TrainingError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ClassifierError> for TrainingError {
    fn from(err: ClassifierError) -> Self {
        Self::Classification(err.to_string())
    }
}
