use serde::{Deserialize, Serialize};

use crate::model::content::Content;
use crate::model::question::{Hint, Question, Solution, UserAnswer};

/// A submitted answer together with the feedback the learner saw for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerAndResponse {
    pub user_answer: UserAnswer,
    pub feedback: Content,
}

/// Wrong answers submitted so far for a question that is not yet answered correctly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingState {
    pub wrong_answers: Vec<AnswerAndResponse>,
}

/// Every answer submitted for a completed question, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedState {
    pub answers: Vec<AnswerAndResponse>,
}

/// Phase of the question under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemeralState {
    Pending(PendingState),
    Completed(CompletedState),
    /// The learner moved past the last question.
    Terminal,
}

impl EphemeralState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

/// Read-only snapshot of where the learner is in the active training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemeralQuestion {
    /// `None` once the session reached its terminal state.
    pub question: Option<Question>,
    pub current_question_index: usize,
    pub total_question_count: usize,
    pub ephemeral_state: EphemeralState,
    /// Hints of the current question with their reveal flags.
    pub hints: Vec<Hint>,
    pub solution: Option<Solution>,
}

impl EphemeralQuestion {
    #[must_use]
    pub fn is_solution_revealed(&self) -> bool {
        self.solution.as_ref().is_some_and(|s| s.revealed)
    }

    #[must_use]
    pub fn revealed_hint_count(&self) -> usize {
        self.hints.iter().filter(|h| h.revealed).count()
    }
}

/// Result of classifying a single submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestionOutcome {
    pub is_correct_answer: bool,
    pub feedback: Content,
}
