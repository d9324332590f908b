#![allow(dead_code)]

use std::sync::Arc;

use practice_core::model::{
    AnswerGroup, AnswerRule, Content, EphemeralQuestion, Hint, Interaction, InteractionAnswer,
    InteractionKind, Outcome, Question, QuestionId, SkillId, Solution, UserAnswer,
};
use practice_core::time::fixed_now;
use services::{
    AnswerClassifier, AsyncResult, Clock, EqualityClassifier, InMemoryExceptionLogger,
    QuestionAssessmentProgressController, QuestionTrainingController, TrainingConfig,
    TrainingRuntime,
};
use storage::repository::InMemoryRepository;

pub const SKILL_0: &str = "test_skill_id_0";
pub const SKILL_1: &str = "test_skill_id_1";
pub const SKILL_2: &str = "test_skill_id_2";

pub const CORRECT_FEEDBACK: &str = "That's correct!";

pub fn skill(id: &str) -> SkillId {
    SkillId::new(id)
}

pub fn all_skills() -> Vec<SkillId> {
    vec![skill(SKILL_0), skill(SKILL_1), skill(SKILL_2)]
}

fn correct_group(answer: InteractionAnswer) -> AnswerGroup {
    AnswerGroup {
        rules: vec![AnswerRule::Equals(answer)],
        outcome: Outcome {
            feedback: Content::new("feedback_correct", CORRECT_FEEDBACK),
            labelled_as_correct: true,
        },
        tagged_skill_misconception_id: None,
    }
}

fn fraction_choices() -> Vec<Content> {
    ["1/2", "1/4", "1/3", "1/5"]
        .iter()
        .enumerate()
        .map(|(i, c)| Content::new(format!("ca_choices_{i}"), *c))
        .collect()
}

fn multiple_choice(
    id: &str,
    prompt: &str,
    skills: &[&str],
    correct: u32,
    solution: bool,
) -> Question {
    let interaction = Interaction {
        kind: InteractionKind::MultipleChoiceInput {
            choices: fraction_choices(),
        },
        answer_groups: vec![correct_group(InteractionAnswer::NonNegativeInt(correct))],
        default_outcome: None,
        hints: vec![
            Hint::new(Content::new("hint_0", "Picture a pie cut into equal slices.")),
            Hint::new(Content::new("hint_1", "Count the slices.")),
        ],
        solution: solution.then(|| Solution {
            correct_answer: InteractionAnswer::NonNegativeInt(correct),
            explanation: Content::new("solution", "Count the equal parts."),
            revealed: false,
        }),
    };
    Question::new(
        QuestionId::new(id),
        Content::new("content", prompt),
        skills.iter().map(|s| skill(s)).collect(),
        interaction,
    )
    .unwrap()
}

fn text_input(id: &str, prompt: &str, skills: &[&str], answer: &str) -> Question {
    let interaction = Interaction {
        kind: InteractionKind::TextInput,
        answer_groups: vec![correct_group(InteractionAnswer::NormalizedString(
            answer.into(),
        ))],
        default_outcome: Some(Outcome {
            feedback: Content::new("default_outcome", "Not quite, try again."),
            labelled_as_correct: false,
        }),
        hints: vec![Hint::new(Content::new("hint_0", "Look at the top number."))],
        solution: None,
    };
    Question::new(
        QuestionId::new(id),
        Content::new("content", prompt),
        skills.iter().map(|s| skill(s)).collect(),
        interaction,
    )
    .unwrap()
}

fn numeric_input(id: &str, prompt: &str, skills: &[&str], answer: f64, misconception: f64) -> Question {
    let interaction = Interaction {
        kind: InteractionKind::NumericInput,
        answer_groups: vec![
            correct_group(InteractionAnswer::Real(answer)),
            AnswerGroup {
                rules: vec![AnswerRule::Equals(InteractionAnswer::Real(misconception))],
                outcome: Outcome {
                    feedback: Content::new("feedback_misconception", "Remember a whole is four quarters."),
                    labelled_as_correct: false,
                },
                tagged_skill_misconception_id: Some(skill(SKILL_2)),
            },
        ],
        default_outcome: None,
        hints: Vec::new(),
        solution: Some(Solution {
            correct_answer: InteractionAnswer::Real(answer),
            explanation: Content::new("solution", "Four quarters make one whole."),
            revealed: false,
        }),
    };
    Question::new(
        QuestionId::new(id),
        Content::new("content", prompt),
        skills.iter().map(|s| skill(s)).collect(),
        interaction,
    )
    .unwrap()
}

pub fn question_bank() -> Vec<Question> {
    vec![
        multiple_choice(
            "question_id_0",
            "What fraction does 'quarter' represent?",
            &[SKILL_0],
            1,
            true,
        ),
        multiple_choice(
            "question_id_1",
            "What fraction does 'half' represent?",
            &[SKILL_0, SKILL_1],
            0,
            false,
        ),
        text_input(
            "question_id_2",
            "What is the numerator of 2/3?",
            &[SKILL_1],
            "2",
        ),
        numeric_input(
            "question_id_3",
            "How many quarters make a whole?",
            &[SKILL_2],
            4.0,
            2.0,
        ),
        text_input(
            "question_id_4",
            "What is the denominator of 3/5?",
            &[SKILL_2],
            "5",
        ),
    ]
}

/// An answer matching the question's first correct rule.
pub fn correct_answer(question: &Question) -> UserAnswer {
    let group = question
        .interaction()
        .answer_groups
        .iter()
        .find(|g| g.outcome.labelled_as_correct)
        .expect("question has a correct group");
    let AnswerRule::Equals(answer) = &group.rules[0];
    UserAnswer::new(answer.clone())
}

/// An answer matching no answer group of the question.
pub fn wrong_answer(question: &Question) -> UserAnswer {
    let matches_any = |candidate: &InteractionAnswer| {
        question.interaction().answer_groups.iter().any(|g| {
            g.rules
                .iter()
                .any(|AnswerRule::Equals(expected)| expected == candidate)
        })
    };
    let answer = match &question.interaction().kind {
        InteractionKind::MultipleChoiceInput { choices } => (0..choices.len())
            .map(|i| InteractionAnswer::NonNegativeInt(u32::try_from(i).unwrap()))
            .find(|candidate| !matches_any(candidate))
            .expect("a wrong choice exists"),
        InteractionKind::NumericInput => InteractionAnswer::Real(-1.0),
        _ => InteractionAnswer::NormalizedString("definitely wrong".into()),
    };
    UserAnswer::new(answer)
}

pub struct Harness {
    pub runtime: TrainingRuntime,
    pub training: QuestionTrainingController,
    pub progress: QuestionAssessmentProgressController,
    pub logger: InMemoryExceptionLogger,
}

pub fn harness(config: TrainingConfig) -> Harness {
    harness_with_classifier(config, Arc::new(EqualityClassifier))
}

pub fn harness_with_classifier(
    config: TrainingConfig,
    classifier: Arc<dyn AnswerClassifier>,
) -> Harness {
    let repo = InMemoryRepository::with_questions(question_bank());
    let logger = InMemoryExceptionLogger::new();
    let (runtime, controllers) = TrainingRuntime::builder(Arc::new(repo), classifier)
        .with_config(config)
        .with_exception_logger(Arc::new(logger.clone()))
        .with_clock(Clock::fixed(fixed_now()))
        .build();
    Harness {
        runtime,
        training: controllers.training,
        progress: controllers.progress,
        logger,
    }
}

pub fn three_per_session(seed: u64) -> TrainingConfig {
    TrainingConfig::new(3, seed)
}

/// Current question view, panicking if it is not a success.
pub fn current(progress: &QuestionAssessmentProgressController) -> EphemeralQuestion {
    match progress.get_current_question().latest() {
        AsyncResult::Success(view) => view,
        other => panic!("expected current question, got {other:?}"),
    }
}

pub fn current_question(progress: &QuestionAssessmentProgressController) -> Question {
    current(progress)
        .question
        .expect("session is not terminal")
}
