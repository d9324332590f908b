use std::fmt::Write as _;

use practice_core::model::{
    Content, EphemeralQuestion, EphemeralState, InteractionKind, UserAssessmentPerformance,
};

/// Drop markup from rich text for terminal display.
pub fn plain(content: &Content) -> String {
    let mut out = String::with_capacity(content.html.len());
    let mut in_tag = false;
    for ch in content.html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn question(view: &EphemeralQuestion) -> String {
    let mut out = String::new();
    let Some(question) = &view.question else {
        return out;
    };

    let _ = writeln!(
        out,
        "\nQuestion {} of {}",
        view.current_question_index + 1,
        view.total_question_count
    );
    let _ = writeln!(out, "{}", plain(question.content()));

    if let InteractionKind::MultipleChoiceInput { choices } = &question.interaction().kind {
        for (i, choice) in choices.iter().enumerate() {
            let _ = writeln!(out, "  {}) {}", i + 1, plain(choice));
        }
    }

    for (i, hint) in view.hints.iter().enumerate().filter(|(_, h)| h.revealed) {
        let _ = writeln!(out, "  hint {}: {}", i + 1, plain(&hint.hint_content));
    }
    if let Some(solution) = view.solution.as_ref().filter(|s| s.revealed) {
        let _ = writeln!(out, "  solution: {}", plain(&solution.explanation));
    }

    match &view.ephemeral_state {
        EphemeralState::Pending(state) if !state.wrong_answers.is_empty() => {
            let _ = writeln!(out, "  ({} wrong so far)", state.wrong_answers.len());
        }
        EphemeralState::Completed(_) => {
            let _ = writeln!(out, "  answered, type `next` to continue");
        }
        _ => {}
    }
    out
}

pub fn performance(performance: &UserAssessmentPerformance) -> String {
    let mut out = String::new();
    let total = performance.total_fraction_score;
    let _ = writeln!(
        out,
        "\nScore: {:.1} / {:.0}",
        total.points_received, total.total_points_available
    );
    for (skill_id, grade) in &performance.fraction_score_per_skill {
        let mastery = performance
            .mastery_per_skill
            .get(skill_id)
            .copied()
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {skill_id}: {:.1} / {:.0}, mastery {mastery:+.2}",
            grade.points_received, grade.total_points_available
        );
    }
    out
}

pub const HELP: &str = "\
Commands:
  <answer>     answer the question (choice number for multiple choice)
  hint [n]     reveal hint n (default 1)
  solution     reveal the solution
  next         move on once the question is answered
  quit         stop practicing and show the score";

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::{FractionGrade, SkillId};
    use std::collections::BTreeMap;

    #[test]
    fn plain_strips_tags_and_collapses_space() {
        let content = Content::html("<p>What is <b>1/2</b>\n of 4?</p>");
        assert_eq!(plain(&content), "What is 1/2 of 4?");
    }

    #[test]
    fn performance_lists_each_skill() {
        let skill = SkillId::new("fractions");
        let summary = UserAssessmentPerformance {
            total_fraction_score: FractionGrade::new(1.9, 2.0),
            fraction_score_per_skill: BTreeMap::from([(
                skill.clone(),
                FractionGrade::new(1.9, 2.0),
            )]),
            mastery_per_skill: BTreeMap::from([(skill, 0.15)]),
        };
        let text = performance(&summary);
        assert!(text.contains("Score: 1.9 / 2"));
        assert!(text.contains("fractions: 1.9 / 2, mastery +0.15"));
    }
}
