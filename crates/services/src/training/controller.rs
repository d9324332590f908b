use std::fmt;

use practice_core::model::{
    AnsweredQuestionOutcome, EphemeralQuestion, Hint, Question, SkillId, Solution, UserAnswer,
    UserAssessmentPerformance,
};

use super::runtime::{Command, RuntimeHandle};
use crate::observe::{DataProvider, Reply};

//
// ─── SESSION LIFECYCLE ─────────────────────────────────────────────────────────
//

/// Starts and stops training sessions.
///
/// Every call returns immediately with a pending provider. The result is
/// published once the runtime applies the request.
#[derive(Clone)]
pub struct QuestionTrainingController {
    handle: RuntimeHandle,
}

impl QuestionTrainingController {
    pub(crate) fn new(handle: RuntimeHandle) -> Self {
        Self { handle }
    }

    /// Start a session over questions linked to `skill_ids`.
    ///
    /// Fails with `InvalidRequest` when no question can be selected and with
    /// `SessionAlreadyActive` while another session is running. Neither
    /// failure touches the active session.
    #[must_use]
    pub fn start_session(&self, skill_ids: Vec<SkillId>) -> DataProvider<()> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::StartSession { skill_ids, reply });
        provider
    }

    /// Stop the active session.
    ///
    /// Progress requests issued before this call and not yet applied fail
    /// with `NoActiveSession`.
    #[must_use]
    pub fn stop_session(&self) -> DataProvider<()> {
        self.handle.bump_epoch();
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::StopSession { reply });
        provider
    }
}

impl fmt::Debug for QuestionTrainingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionTrainingController")
            .finish_non_exhaustive()
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Moves the learner through the active session.
#[derive(Clone)]
pub struct QuestionAssessmentProgressController {
    handle: RuntimeHandle,
}

impl QuestionAssessmentProgressController {
    pub(crate) fn new(handle: RuntimeHandle) -> Self {
        Self { handle }
    }

    /// Live view of the current question.
    ///
    /// `Pending` while a session loads or an answer is being classified,
    /// `Failure(NoActiveSession)` when no session is running.
    #[must_use]
    pub fn get_current_question(&self) -> DataProvider<EphemeralQuestion> {
        self.handle.current_question()
    }

    /// Classify `answer` against the current question and record it.
    #[must_use]
    pub fn submit_answer(&self, answer: UserAnswer) -> DataProvider<AnsweredQuestionOutcome> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::SubmitAnswer {
            answer,
            issued_epoch: self.handle.epoch(),
            reply,
        });
        provider
    }

    /// Advance past the current question once it is completed.
    #[must_use]
    pub fn move_to_next_question(&self) -> DataProvider<()> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::MoveToNext {
            issued_epoch: self.handle.epoch(),
            reply,
        });
        provider
    }

    /// Set whether hint `hint_index` of `question` is revealed.
    ///
    /// `question` must be the current question.
    #[must_use]
    pub fn submit_hint_is_revealed(
        &self,
        question: &Question,
        revealed: bool,
        hint_index: usize,
    ) -> DataProvider<Hint> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::RevealHint {
            question_id: question.id().clone(),
            revealed,
            hint_index,
            issued_epoch: self.handle.epoch(),
            reply,
        });
        provider
    }

    #[must_use]
    pub fn submit_solution_is_revealed(&self, question: &Question) -> DataProvider<Solution> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::RevealSolution {
            question_id: question.id().clone(),
            issued_epoch: self.handle.epoch(),
            reply,
        });
        provider
    }

    /// Score and mastery over the questions completed so far, for `skill_ids`.
    #[must_use]
    pub fn calculate_performance(
        &self,
        skill_ids: Vec<SkillId>,
    ) -> DataProvider<UserAssessmentPerformance> {
        let (reply, provider) = Reply::channel();
        self.handle.send(Command::CalculatePerformance {
            skill_ids,
            issued_epoch: self.handle.epoch(),
            reply,
        });
        provider
    }
}

impl fmt::Debug for QuestionAssessmentProgressController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionAssessmentProgressController")
            .finish_non_exhaustive()
    }
}
