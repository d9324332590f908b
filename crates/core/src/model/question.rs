use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::content::Content;
use crate::model::ids::{QuestionId, SkillId};

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// A raw answer value, shaped by the interaction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAnswer {
    /// Index into a multiple choice list.
    NonNegativeInt(u32),
    Real(f64),
    NormalizedString(String),
}

/// What the learner submitted, plus a human readable rendering of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub answer: InteractionAnswer,
    #[serde(default)]
    pub plain_answer: String,
}

impl UserAnswer {
    #[must_use]
    pub fn new(answer: InteractionAnswer) -> Self {
        let plain_answer = match &answer {
            InteractionAnswer::NonNegativeInt(v) => v.to_string(),
            InteractionAnswer::Real(v) => v.to_string(),
            InteractionAnswer::NormalizedString(s) => s.clone(),
        };
        Self {
            answer,
            plain_answer,
        }
    }
}

//
// ─── INTERACTION ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum InteractionKind {
    MultipleChoiceInput { choices: Vec<Content> },
    TextInput,
    NumericInput,
    Continue,
}

/// A single matching rule evaluated by the answer classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerRule {
    Equals(InteractionAnswer),
}

/// Feedback and correctness attached to an answer group or the default path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub feedback: Content,
    #[serde(default)]
    pub labelled_as_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerGroup {
    pub rules: Vec<AnswerRule>,
    pub outcome: Outcome,
    /// Skill whose misconception this group detects, if any.
    #[serde(default)]
    pub tagged_skill_misconception_id: Option<SkillId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub hint_content: Content,
    #[serde(default)]
    pub revealed: bool,
}

impl Hint {
    pub fn new(hint_content: Content) -> Self {
        Self {
            hint_content,
            revealed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub correct_answer: InteractionAnswer,
    pub explanation: Content,
    #[serde(default)]
    pub revealed: bool,
}

/// Everything the classifier and the learner need to work on a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    #[serde(default)]
    pub answer_groups: Vec<AnswerGroup>,
    #[serde(default)]
    pub default_outcome: Option<Outcome>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default)]
    pub solution: Option<Solution>,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question shape, as read from a question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub content: Content,
    pub linked_skill_ids: Vec<SkillId>,
    pub interaction: Interaction,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or content is blank, no skill is linked,
    /// a multiple choice interaction has no choices, or nothing can be answered correctly.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.id.as_str().trim().is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.content.is_empty() {
            return Err(QuestionError::EmptyContent(self.id));
        }
        if self.linked_skill_ids.is_empty() {
            return Err(QuestionError::NoLinkedSkills(self.id));
        }
        if let InteractionKind::MultipleChoiceInput { choices } = &self.interaction.kind {
            if choices.is_empty() {
                return Err(QuestionError::MissingChoices(self.id));
            }
        }
        let answerable = matches!(self.interaction.kind, InteractionKind::Continue)
            || self
                .interaction
                .answer_groups
                .iter()
                .any(|group| group.outcome.labelled_as_correct);
        if !answerable {
            return Err(QuestionError::NoCorrectAnswerGroup(self.id));
        }

        Ok(Question {
            id: self.id,
            content: self.content,
            linked_skill_ids: self.linked_skill_ids,
            interaction: self.interaction,
        })
    }
}

/// An immutable practice question, owned by the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    content: Content,
    linked_skill_ids: Vec<SkillId>,
    interaction: Interaction,
}

impl Question {
    /// Convenience constructor that validates in one step.
    ///
    /// # Errors
    ///
    /// See [`QuestionDraft::validate`].
    pub fn new(
        id: QuestionId,
        content: Content,
        linked_skill_ids: Vec<SkillId>,
        interaction: Interaction,
    ) -> Result<Self, QuestionError> {
        QuestionDraft {
            id,
            content,
            linked_skill_ids,
            interaction,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub fn linked_skill_ids(&self) -> &[SkillId] {
        &self.linked_skill_ids
    }

    #[must_use]
    pub fn is_linked_to(&self, skill_id: &SkillId) -> bool {
        self.linked_skill_ids.contains(skill_id)
    }

    #[must_use]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            content: question.content,
            linked_skill_ids: question.linked_skill_ids,
            interaction: question.interaction,
        }
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {0} has no content")]
    EmptyContent(QuestionId),

    #[error("question {0} is not linked to any skill")]
    NoLinkedSkills(QuestionId),

    #[error("question {0} offers no choices")]
    MissingChoices(QuestionId),

    #[error("question {0} has no answer group labelled as correct")]
    NoCorrectAnswerGroup(QuestionId),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
