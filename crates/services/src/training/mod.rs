mod controller;
mod plan;
mod runtime;
mod session;

// Public API of the training subsystem.
pub use controller::{QuestionAssessmentProgressController, QuestionTrainingController};
pub use plan::{QuestionSelector, RoundRobinBySkill, SelectionStrategy, ShuffleThenTruncate};
pub use runtime::{TrainingControllers, TrainingRuntime, TrainingRuntimeBuilder};
pub use session::{SessionLifecycle, TrainingSession};
