pub mod content;
mod ephemeral;
mod ids;
mod performance;
mod question;

pub use content::Content;
pub use ids::{ParseIdError, QuestionId, SessionId, SkillId};

pub use ephemeral::{
    AnswerAndResponse, AnsweredQuestionOutcome, CompletedState, EphemeralQuestion,
    EphemeralState, PendingState,
};
pub use performance::{FractionGrade, UserAssessmentPerformance};
pub use question::{
    AnswerGroup, AnswerRule, Hint, Interaction, InteractionAnswer, InteractionKind, Outcome,
    Question, QuestionDraft, QuestionError, Solution, UserAnswer,
};
