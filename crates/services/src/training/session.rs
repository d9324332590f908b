use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use practice_core::assessment::{QuestionSessionMetrics, calculate_performance};
use practice_core::model::{
    AnswerAndResponse, AnsweredQuestionOutcome, CompletedState, EphemeralQuestion,
    EphemeralState, Hint, PendingState, Question, QuestionId, SessionId, SkillId, Solution,
    UserAnswer, UserAssessmentPerformance,
};

use crate::classifier::Verdict;
use crate::error::TrainingError;

//
// ─── PER-QUESTION PROGRESS ─────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq)]
enum AnswerPhase {
    Pending(Vec<AnswerAndResponse>),
    Completed(Vec<AnswerAndResponse>),
}

/// Learner activity on one question of the session.
///
/// Hints and the solution are copied from the question so reveal flags never
/// leak back into the question bank.
#[derive(Debug, Clone)]
struct QuestionProgress {
    question: Question,
    hints: Vec<Hint>,
    solution: Option<Solution>,
    phase: AnswerPhase,
    // Activity before the first correct answer, for scoring.
    wrong_before_correct: u32,
    misconceptions: Vec<SkillId>,
    hints_used: BTreeSet<usize>,
    solution_used: bool,
}

impl QuestionProgress {
    fn new(question: Question) -> Self {
        let mut hints = question.interaction().hints.clone();
        for hint in &mut hints {
            hint.revealed = false;
        }
        let solution = question.interaction().solution.clone().map(|mut s| {
            s.revealed = false;
            s
        });
        Self {
            question,
            hints,
            solution,
            phase: AnswerPhase::Pending(Vec::new()),
            wrong_before_correct: 0,
            misconceptions: Vec::new(),
            hints_used: BTreeSet::new(),
            solution_used: false,
        }
    }

    fn is_completed(&self) -> bool {
        matches!(self.phase, AnswerPhase::Completed(_))
    }

    fn ephemeral_state(&self) -> EphemeralState {
        match &self.phase {
            AnswerPhase::Pending(wrong_answers) => EphemeralState::Pending(PendingState {
                wrong_answers: wrong_answers.clone(),
            }),
            AnswerPhase::Completed(answers) => EphemeralState::Completed(CompletedState {
                answers: answers.clone(),
            }),
        }
    }

    fn record(&mut self, answer: AnswerAndResponse, verdict: &Verdict) {
        match &mut self.phase {
            AnswerPhase::Pending(wrong_answers) if verdict.is_correct => {
                let mut answers = std::mem::take(wrong_answers);
                answers.push(answer);
                self.phase = AnswerPhase::Completed(answers);
            }
            AnswerPhase::Pending(wrong_answers) => {
                wrong_answers.push(answer);
                self.wrong_before_correct += 1;
                if let Some(skill_id) = &verdict.misconception_skill_id {
                    self.misconceptions.push(skill_id.clone());
                }
            }
            AnswerPhase::Completed(answers) => answers.push(answer),
        }
    }

    fn metrics(&self) -> QuestionSessionMetrics {
        let mut metrics = QuestionSessionMetrics::new(self.question.clone());
        metrics.wrong_answer_count = self.wrong_before_correct;
        metrics.hints_revealed = u32::try_from(self.hints_used.len()).unwrap_or(u32::MAX);
        metrics.solution_revealed = self.solution_used;
        metrics.misconception_skill_ids = self.misconceptions.clone();
        metrics
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    Active,
    Ended,
}

/// One run through a fixed, ordered list of questions.
///
/// The cursor only moves forward. Once it equals the number of questions the
/// session is terminal and only stopping it remains.
pub struct TrainingSession {
    id: SessionId,
    skill_ids: Vec<SkillId>,
    progress: Vec<QuestionProgress>,
    cursor: usize,
    lifecycle: SessionLifecycle,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl TrainingSession {
    /// Create a session positioned on the first question.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidRequest` if `questions` is empty.
    pub fn new(
        id: SessionId,
        skill_ids: Vec<SkillId>,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, TrainingError> {
        if questions.is_empty() {
            return Err(TrainingError::InvalidRequest);
        }
        Ok(Self {
            id,
            skill_ids,
            progress: questions.into_iter().map(QuestionProgress::new).collect(),
            cursor: 0,
            lifecycle: SessionLifecycle::Active,
            started_at,
            ended_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn skill_ids(&self) -> &[SkillId] {
        &self.skill_ids
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.progress.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.cursor >= self.progress.len()
    }

    /// Questions in session order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.progress.iter().map(|p| &p.question)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.progress.get(self.cursor).map(|p| &p.question)
    }

    /// Snapshot of the cursor position for observers.
    #[must_use]
    pub fn ephemeral_question(&self) -> EphemeralQuestion {
        match self.progress.get(self.cursor) {
            Some(current) => EphemeralQuestion {
                question: Some(current.question.clone()),
                current_question_index: self.cursor,
                total_question_count: self.progress.len(),
                ephemeral_state: current.ephemeral_state(),
                hints: current.hints.clone(),
                solution: current.solution.clone(),
            },
            None => EphemeralQuestion {
                question: None,
                current_question_index: self.cursor,
                total_question_count: self.progress.len(),
                ephemeral_state: EphemeralState::Terminal,
                hints: Vec::new(),
                solution: None,
            },
        }
    }

    /// The question an answer would be submitted for.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionFinished` once the session is terminal.
    pub fn answerable_question(&self) -> Result<&Question, TrainingError> {
        self.current_question().ok_or(TrainingError::SessionFinished)
    }

    /// Fold a classified answer into the current question.
    ///
    /// The first correct answer completes the question. Later answers are
    /// appended to the completed list and never reopen it.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::SessionFinished` once the session is terminal.
    pub fn record_answer(
        &mut self,
        user_answer: UserAnswer,
        verdict: Verdict,
    ) -> Result<AnsweredQuestionOutcome, TrainingError> {
        let current = self
            .progress
            .get_mut(self.cursor)
            .ok_or(TrainingError::SessionFinished)?;

        let outcome = AnsweredQuestionOutcome {
            is_correct_answer: verdict.is_correct,
            feedback: verdict.feedback.clone(),
        };
        current.record(
            AnswerAndResponse {
                user_answer,
                feedback: verdict.feedback.clone(),
            },
            &verdict,
        );
        Ok(outcome)
    }

    /// Advance past a completed question.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::IllegalNavigation` if the current question is
    /// still pending or the session is already terminal.
    pub fn move_to_next(&mut self) -> Result<(), TrainingError> {
        match self.progress.get(self.cursor) {
            Some(current) if current.is_completed() => {
                self.cursor += 1;
                Ok(())
            }
            _ => Err(TrainingError::IllegalNavigation),
        }
    }

    fn current_for(&mut self, question_id: &QuestionId) -> Result<&mut QuestionProgress, TrainingError> {
        let current = self
            .progress
            .get_mut(self.cursor)
            .ok_or(TrainingError::SessionFinished)?;
        if current.question.id() != question_id {
            return Err(TrainingError::QuestionNotCurrent(question_id.to_string()));
        }
        Ok(current)
    }

    /// Set the reveal flag of one hint on the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotCurrent` for any other question,
    /// `HintIndexOutOfRange` for a bad index, or `SessionFinished` once terminal.
    pub fn reveal_hint(
        &mut self,
        question_id: &QuestionId,
        revealed: bool,
        hint_index: usize,
    ) -> Result<Hint, TrainingError> {
        let current = self.current_for(question_id)?;
        let count = current.hints.len();
        let completed = current.is_completed();
        let hint = current
            .hints
            .get_mut(hint_index)
            .ok_or(TrainingError::HintIndexOutOfRange {
                index: hint_index,
                count,
            })?;
        hint.revealed = revealed;
        let hint = hint.clone();
        if revealed && !completed {
            current.hints_used.insert(hint_index);
        }
        Ok(hint)
    }

    /// Reveal the current question's solution.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotCurrent` for any other question, `NoSolution` when
    /// the question has none, or `SessionFinished` once terminal.
    pub fn reveal_solution(&mut self, question_id: &QuestionId) -> Result<Solution, TrainingError> {
        let current = self.current_for(question_id)?;
        let completed = current.is_completed();
        let solution = current
            .solution
            .as_mut()
            .ok_or_else(|| TrainingError::NoSolution(question_id.to_string()))?;
        solution.revealed = true;
        let solution = solution.clone();
        if !completed {
            current.solution_used = true;
        }
        Ok(solution)
    }

    /// Scoring inputs for every completed question, in session order.
    #[must_use]
    pub fn metrics(&self) -> Vec<QuestionSessionMetrics> {
        self.progress
            .iter()
            .filter(|p| p.is_completed())
            .map(QuestionProgress::metrics)
            .collect()
    }

    /// Score and mastery over the completed questions, restricted to `skill_ids`.
    #[must_use]
    pub fn performance(&self, skill_ids: &[SkillId]) -> UserAssessmentPerformance {
        calculate_performance(&self.metrics(), skill_ids)
    }

    pub fn end(&mut self, ended_at: DateTime<Utc>) {
        self.lifecycle = SessionLifecycle::Ended;
        self.ended_at = Some(ended_at);
    }
}

impl fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingSession")
            .field("id", &self.id)
            .field("skill_ids", &self.skill_ids)
            .field("questions_len", &self.progress.len())
            .field("cursor", &self.cursor)
            .field("lifecycle", &self.lifecycle)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
