use async_trait::async_trait;
use practice_core::model::{
    AnswerRule, Content, Interaction, InteractionAnswer, InteractionKind, SkillId,
};

use crate::error::ClassifierError;

/// How a single answer was judged.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_correct: bool,
    /// Empty when no rule matched and the interaction has no default feedback.
    pub feedback: Content,
    /// Skill whose misconception the answer revealed, if the matched group was tagged.
    pub misconception_skill_id: Option<SkillId>,
}

impl Verdict {
    #[must_use]
    pub fn correct(feedback: Content) -> Self {
        Self {
            is_correct: true,
            feedback,
            misconception_skill_id: None,
        }
    }

    #[must_use]
    pub fn wrong(feedback: Content) -> Self {
        Self {
            is_correct: false,
            feedback,
            misconception_skill_id: None,
        }
    }
}

/// Judges a learner's answer against an interaction's answer groups.
#[async_trait]
pub trait AnswerClassifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `ClassifierError` if the answer cannot be evaluated at all.
    async fn classify(
        &self,
        interaction: &Interaction,
        answer: &InteractionAnswer,
    ) -> Result<Verdict, ClassifierError>;
}

/// Reference classifier that only understands `AnswerRule::Equals`.
///
/// Answer groups are tried in order and the first match wins. Unmatched
/// answers fall back to the interaction's default outcome, or to an empty,
/// incorrect verdict when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualityClassifier;

fn kind_name(kind: &InteractionKind) -> &'static str {
    match kind {
        InteractionKind::MultipleChoiceInput { .. } => "multiple choice",
        InteractionKind::TextInput => "text input",
        InteractionKind::NumericInput => "numeric input",
        InteractionKind::Continue => "continue",
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn answers_equal(expected: &InteractionAnswer, actual: &InteractionAnswer) -> bool {
    const REAL_TOLERANCE: f64 = 1e-9;
    match (expected, actual) {
        (InteractionAnswer::NonNegativeInt(a), InteractionAnswer::NonNegativeInt(b)) => a == b,
        (InteractionAnswer::Real(a), InteractionAnswer::Real(b)) => (a - b).abs() < REAL_TOLERANCE,
        (InteractionAnswer::Real(a), InteractionAnswer::NonNegativeInt(b))
        | (InteractionAnswer::NonNegativeInt(b), InteractionAnswer::Real(a)) => {
            (a - f64::from(*b)).abs() < REAL_TOLERANCE
        }
        (InteractionAnswer::NormalizedString(a), InteractionAnswer::NormalizedString(b)) => {
            normalize(a) == normalize(b)
        }
        _ => false,
    }
}

fn check_compatible(
    kind: &InteractionKind,
    answer: &InteractionAnswer,
) -> Result<(), ClassifierError> {
    let compatible = match (kind, answer) {
        (InteractionKind::MultipleChoiceInput { choices }, InteractionAnswer::NonNegativeInt(i)) => {
            usize::try_from(*i).is_ok_and(|i| i < choices.len())
        }
        (InteractionKind::TextInput, InteractionAnswer::NormalizedString(_)) => true,
        (
            InteractionKind::NumericInput,
            InteractionAnswer::Real(_) | InteractionAnswer::NonNegativeInt(_),
        ) => true,
        (InteractionKind::Continue, _) => true,
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(ClassifierError::IncompatibleAnswer {
            interaction: kind_name(kind),
            answer: format!("{answer:?}"),
        })
    }
}

#[async_trait]
impl AnswerClassifier for EqualityClassifier {
    async fn classify(
        &self,
        interaction: &Interaction,
        answer: &InteractionAnswer,
    ) -> Result<Verdict, ClassifierError> {
        check_compatible(&interaction.kind, answer)?;

        if matches!(interaction.kind, InteractionKind::Continue) {
            return Ok(Verdict::correct(Content::empty()));
        }

        let matched = interaction.answer_groups.iter().find(|group| {
            group.rules.iter().any(|rule| match rule {
                AnswerRule::Equals(expected) => answers_equal(expected, answer),
            })
        });

        let verdict = match matched {
            Some(group) => Verdict {
                is_correct: group.outcome.labelled_as_correct,
                feedback: group.outcome.feedback.clone(),
                misconception_skill_id: if group.outcome.labelled_as_correct {
                    None
                } else {
                    group.tagged_skill_misconception_id.clone()
                },
            },
            None => match &interaction.default_outcome {
                Some(outcome) => Verdict {
                    is_correct: outcome.labelled_as_correct,
                    feedback: outcome.feedback.clone(),
                    misconception_skill_id: None,
                },
                None => Verdict::wrong(Content::empty()),
            },
        };
        Ok(verdict)
    }
}
