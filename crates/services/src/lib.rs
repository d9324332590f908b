#![forbid(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod exceptions;
pub mod observe;
pub mod training;

pub use practice_core::Clock;

pub use classifier::{AnswerClassifier, EqualityClassifier, Verdict};
pub use config::TrainingConfig;
pub use error::{ClassifierError, TrainingError};
pub use exceptions::{ExceptionLogger, InMemoryExceptionLogger, TracingExceptionLogger};
pub use observe::{AsyncResult, DataProvider, Subscription};

pub use training::{
    QuestionAssessmentProgressController, QuestionSelector, QuestionTrainingController,
    RoundRobinBySkill, SelectionStrategy, ShuffleThenTruncate, TrainingControllers,
    TrainingRuntime, TrainingRuntimeBuilder, TrainingSession,
};
