use std::collections::BTreeMap;

use crate::model::{FractionGrade, Question, SkillId, UserAssessmentPerformance};

//
// ─── WEIGHTS ───────────────────────────────────────────────────────────────────
//

// Scores are tracked in tenths of a point so sums stay exact.
const MAX_SCORE_PER_QUESTION: i64 = 10;
const WRONG_ANSWER_SCORE_PENALTY: i64 = 1;
const VIEW_HINT_SCORE_PENALTY: i64 = 1;
const SCORE_SCALE: f64 = 10.0;

// Mastery is tracked in hundredths.
const MAX_MASTERY_GAIN_PER_QUESTION: i64 = 10;
const MAX_MASTERY_LOSS_PER_QUESTION: i64 = -10;
const WRONG_ANSWER_MASTERY_PENALTY: i64 = 5;
const VIEW_HINT_MASTERY_PENALTY: i64 = 2;
const MASTERY_SCALE: f64 = 100.0;

//
// ─── METRICS ───────────────────────────────────────────────────────────────────
//

/// What the learner did on one completed question.
///
/// Only activity up to the first correct answer counts.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSessionMetrics {
    pub question: Question,
    pub wrong_answer_count: u32,
    pub hints_revealed: u32,
    pub solution_revealed: bool,
    /// Misconception skill reported for each tagged wrong answer.
    pub misconception_skill_ids: Vec<SkillId>,
}

impl QuestionSessionMetrics {
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self {
            question,
            wrong_answer_count: 0,
            hints_revealed: 0,
            solution_revealed: false,
            misconception_skill_ids: Vec::new(),
        }
    }

    /// Question score in tenths of a point.
    fn score_tenths(&self) -> i64 {
        if self.solution_revealed {
            return 0;
        }
        let penalty = i64::from(self.wrong_answer_count) * WRONG_ANSWER_SCORE_PENALTY
            + i64::from(self.hints_revealed) * VIEW_HINT_SCORE_PENALTY;
        (MAX_SCORE_PER_QUESTION - penalty).max(0)
    }

    /// Mastery change for one linked skill in hundredths.
    fn mastery_hundredths(&self, skill_id: &SkillId) -> i64 {
        if self.solution_revealed {
            return MAX_MASTERY_LOSS_PER_QUESTION;
        }

        let linked = self.question.linked_skill_ids();
        let tagged_linked: Vec<&SkillId> = self
            .misconception_skill_ids
            .iter()
            .filter(|id| linked.contains(id))
            .collect();
        let untagged = i64::from(self.wrong_answer_count)
            .saturating_sub(i64::try_from(tagged_linked.len()).unwrap_or(i64::MAX))
            .max(0);
        let tagged_for_skill =
            i64::try_from(tagged_linked.iter().filter(|id| **id == skill_id).count())
                .unwrap_or(i64::MAX);

        let penalty = (untagged + tagged_for_skill) * WRONG_ANSWER_MASTERY_PENALTY
            + i64::from(self.hints_revealed) * VIEW_HINT_MASTERY_PENALTY;
        (MAX_MASTERY_GAIN_PER_QUESTION - penalty).max(MAX_MASTERY_LOSS_PER_QUESTION)
    }
}

//
// ─── CALCULATION ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tally {
    points_tenths: i64,
    questions: u32,
}

impl Tally {
    #[allow(clippy::cast_precision_loss)]
    fn grade(&self) -> FractionGrade {
        FractionGrade::new(
            self.points_tenths as f64 / SCORE_SCALE,
            f64::from(self.questions),
        )
    }
}

/// Score and mastery for a finished (or partially finished) session.
///
/// Per-skill entries are restricted to `skill_ids`; a question linked to several
/// requested skills counts toward each of them.
///
/// ```
/// # use practice_core::assessment::{calculate_performance, QuestionSessionMetrics};
/// # use practice_core::model::{Content, Interaction, InteractionKind, Question, QuestionId, SkillId};
/// let interaction = Interaction {
///     kind: InteractionKind::Continue,
///     answer_groups: Vec::new(),
///     default_outcome: None,
///     hints: Vec::new(),
///     solution: None,
/// };
/// let skill = SkillId::new("s1");
/// let question =
///     Question::new(QuestionId::new("q1"), Content::html("Go"), vec![skill.clone()], interaction)?;
/// let mut metrics = QuestionSessionMetrics::new(question);
/// metrics.wrong_answer_count = 2;
///
/// let performance = calculate_performance(&[metrics], &[skill.clone()]);
/// assert_eq!(performance.total_fraction_score.points_received, 0.8);
/// # Ok::<(), practice_core::model::QuestionError>(())
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_performance(
    metrics: &[QuestionSessionMetrics],
    skill_ids: &[SkillId],
) -> UserAssessmentPerformance {
    let mut total = Tally::default();
    let mut per_skill: BTreeMap<SkillId, Tally> = BTreeMap::new();
    let mut mastery: BTreeMap<SkillId, i64> = BTreeMap::new();

    for question_metrics in metrics {
        let score = question_metrics.score_tenths();
        total.points_tenths += score;
        total.questions += 1;

        for skill_id in question_metrics.question.linked_skill_ids() {
            if !skill_ids.contains(skill_id) {
                continue;
            }
            let tally = per_skill.entry(skill_id.clone()).or_default();
            tally.points_tenths += score;
            tally.questions += 1;

            *mastery.entry(skill_id.clone()).or_default() +=
                question_metrics.mastery_hundredths(skill_id);
        }
    }

    UserAssessmentPerformance {
        total_fraction_score: total.grade(),
        fraction_score_per_skill: per_skill
            .into_iter()
            .map(|(skill_id, tally)| (skill_id, tally.grade()))
            .collect(),
        mastery_per_skill: mastery
            .into_iter()
            .map(|(skill_id, value)| (skill_id, value as f64 / MASTERY_SCALE))
            .collect(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
