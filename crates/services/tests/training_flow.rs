mod common;

use practice_core::model::{EphemeralState, FractionGrade, InteractionAnswer, UserAnswer};
use services::{AsyncResult, TrainingConfig, TrainingError};

use common::{
    CORRECT_FEEDBACK, SKILL_0, SKILL_1, SKILL_2, all_skills, correct_answer, current,
    current_question, harness, skill, three_per_session, wrong_answer,
};

#[tokio::test]
async fn nothing_is_applied_until_the_runtime_runs() {
    let mut h = harness(three_per_session(0));

    let start = h.training.start_session(all_skills());
    assert!(start.latest().is_pending());
    assert!(!h.runtime.has_active_session());

    assert_eq!(h.runtime.run_current().await, 1);
    assert_eq!(start.latest(), AsyncResult::Success(()));
    assert!(h.runtime.has_active_session());
}

#[tokio::test]
async fn start_publishes_loading_then_first_pending_question() {
    let mut h = harness(three_per_session(0));
    let mut updates = h.progress.get_current_question().subscribe();

    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let values = updates.drain();
    assert_eq!(values.len(), 3);
    assert!(matches!(
        &values[0],
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));
    assert!(values[1].is_pending());

    let view = values[2].success().expect("first question");
    assert_eq!(view.current_question_index, 0);
    assert_eq!(view.total_question_count, 3);
    assert!(view.question.is_some());
    assert!(view.ephemeral_state.is_pending());
}

#[tokio::test]
async fn late_subscribers_see_latest_question_first() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let mut updates = h.progress.get_current_question().subscribe();
    let first = updates.try_next().expect("replayed value");
    assert_eq!(first.success(), Some(&current(&h.progress)));
    assert!(updates.try_next().is_none());
}

#[tokio::test]
async fn start_with_no_skills_fails_without_activating_session() {
    let mut h = harness(three_per_session(0));

    let start = h.training.start_session(Vec::new());
    h.runtime.run_current().await;

    assert_eq!(
        start.latest(),
        AsyncResult::Failure(TrainingError::InvalidRequest)
    );
    assert_eq!(
        start.latest().failure().map(ToString::to_string),
        Some("Expected at least 1 question".to_string())
    );
    assert_eq!(
        h.progress.get_current_question().latest(),
        AsyncResult::Failure(TrainingError::InvalidRequest)
    );
    assert!(!h.runtime.has_active_session());
    assert_eq!(
        h.logger.most_recent().map(|e| e.error),
        Some(TrainingError::InvalidRequest)
    );
}

#[tokio::test]
async fn valid_start_after_failed_start_begins_fresh() {
    let mut h = harness(three_per_session(0));

    let _ = h.training.start_session(Vec::new());
    let stop = h.training.stop_session();
    let start = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    assert_eq!(stop.latest(), AsyncResult::Success(()));
    assert_eq!(start.latest(), AsyncResult::Success(()));
    let view = current(&h.progress);
    assert_eq!(view.current_question_index, 0);
    assert!(view.ephemeral_state.is_pending());
}

#[tokio::test]
async fn stopping_a_failed_start_clears_it_once() {
    let mut h = harness(three_per_session(0));

    let _ = h.training.start_session(Vec::new());
    h.runtime.run_current().await;
    let stop = h.training.stop_session();
    h.runtime.run_current().await;

    assert_eq!(stop.latest(), AsyncResult::Success(()));
    assert!(matches!(
        h.progress.get_current_question().latest(),
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));
    assert!(!h.runtime.has_active_session());

    let again = h.training.stop_session();
    h.runtime.run_current().await;
    assert!(matches!(
        again.latest(),
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));
}

#[tokio::test]
async fn start_directly_after_failed_start_is_accepted() {
    let mut h = harness(three_per_session(0));

    let _ = h.training.start_session(Vec::new());
    let start = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    assert_eq!(start.latest(), AsyncResult::Success(()));
    assert_eq!(current(&h.progress).current_question_index, 0);
}

#[tokio::test]
async fn unknown_skills_fail_like_an_empty_request() {
    let mut h = harness(three_per_session(0));
    let start = h.training.start_session(vec![skill("no_such_skill")]);
    h.runtime.run_current().await;
    assert_eq!(
        start.latest(),
        AsyncResult::Failure(TrainingError::InvalidRequest)
    );
}

#[tokio::test]
async fn start_while_active_is_rejected_and_leaves_session_alone() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let _ = h.progress.submit_answer(correct_answer(&question));
    h.runtime.run_current().await;
    let before = current(&h.progress);

    let second = h.training.start_session(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    assert_eq!(
        second.latest().failure().map(ToString::to_string),
        Some(
            "Cannot start a new training session until the previous one is completed."
                .to_string()
        )
    );
    assert_eq!(current(&h.progress), before);
    assert!(before.ephemeral_state.is_completed());
}

#[tokio::test]
async fn stop_without_start_fails_and_is_logged() {
    let mut h = harness(three_per_session(0));

    let stop = h.training.stop_session();
    h.runtime.run_current().await;

    let expected = "Cannot stop a new training session which wasn't started.";
    assert_eq!(
        stop.latest().failure().map(ToString::to_string),
        Some(expected.to_string())
    );
    let logged = h.logger.most_recent().expect("logged failure");
    assert_eq!(logged.error.to_string(), expected);
    assert_eq!(logged.logged_at, practice_core::time::fixed_now());
}

#[tokio::test]
async fn progress_operations_require_a_session() {
    let mut h = harness(three_per_session(0));

    let submit = h.progress.submit_answer(correct_answer(&common::question_bank()[0]));
    let next = h.progress.move_to_next_question();
    let performance = h.progress.calculate_performance(all_skills());
    h.runtime.run_current().await;

    assert_eq!(
        submit.latest().failure().map(ToString::to_string),
        Some("Cannot submit an answer if a training session has not yet begun.".to_string())
    );
    assert_eq!(
        next.latest().failure().map(ToString::to_string),
        Some("Cannot navigate to a next question if a training session has not begun.".to_string())
    );
    assert!(matches!(
        performance.latest(),
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));
    assert_eq!(h.logger.entries().len(), 3);
}

#[tokio::test]
async fn wrong_answer_stays_pending_with_empty_feedback() {
    // Skill 0 only has multiple choice questions without a default outcome.
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let outcome = h.progress.submit_answer(wrong_answer(&question));
    h.runtime.run_current().await;

    let outcome = outcome.latest();
    let outcome = outcome.success().expect("classified");
    assert!(!outcome.is_correct_answer);
    assert!(outcome.feedback.is_empty());

    match current(&h.progress).ephemeral_state {
        EphemeralState::Pending(state) => {
            assert_eq!(state.wrong_answers.len(), 1);
            assert!(state.wrong_answers[0].feedback.is_empty());
        }
        other => panic!("expected pending, got {other:?}"),
    }
}

#[tokio::test]
async fn correct_answer_completes_question_once() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let _ = h.progress.submit_answer(wrong_answer(&question));
    let correct = h.progress.submit_answer(correct_answer(&question));
    let again = h.progress.submit_answer(wrong_answer(&question));
    h.runtime.run_current().await;

    let correct = correct.latest();
    let correct = correct.success().expect("classified");
    assert!(correct.is_correct_answer);
    assert!(correct.feedback.html.contains(CORRECT_FEEDBACK));
    assert!(again.latest().is_success());

    match current(&h.progress).ephemeral_state {
        EphemeralState::Completed(state) => {
            assert_eq!(state.answers.len(), 3);
            assert!(state.answers[1].feedback.html.contains(CORRECT_FEEDBACK));
        }
        other => panic!("expected completed, got {other:?}"),
    }
}

#[tokio::test]
async fn current_question_is_pending_while_an_answer_is_classified() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let mut updates = h.progress.get_current_question().subscribe();
    let _ = h.progress.submit_answer(correct_answer(&question));
    h.runtime.run_current().await;

    let values = updates.drain();
    assert_eq!(values.len(), 3);
    assert!(values[0].success().is_some_and(|v| v.ephemeral_state.is_pending()));
    assert!(values[1].is_pending());
    assert!(values[2].success().is_some_and(|v| v.ephemeral_state.is_completed()));
}

#[tokio::test]
async fn cannot_move_past_a_pending_question() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let next = h.progress.move_to_next_question();
    h.runtime.run_current().await;

    assert_eq!(
        next.latest().failure().map(ToString::to_string),
        Some("Cannot navigate to next state; at most recent state.".to_string())
    );
    assert_eq!(current(&h.progress).current_question_index, 0);
}

#[tokio::test]
async fn completing_every_question_reaches_terminal_state() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    for index in 0..3 {
        let view = current(&h.progress);
        assert_eq!(view.current_question_index, index);
        let question = view.question.expect("question");
        let _ = h.progress.submit_answer(correct_answer(&question));
        let next = h.progress.move_to_next_question();
        h.runtime.run_current().await;
        assert_eq!(next.latest(), AsyncResult::Success(()));
    }

    let terminal = current(&h.progress);
    assert_eq!(terminal.ephemeral_state, EphemeralState::Terminal);
    assert_eq!(terminal.current_question_index, 3);
    assert_eq!(terminal.total_question_count, 3);
    assert!(terminal.question.is_none());

    let next = h.progress.move_to_next_question();
    let submit = h.progress.submit_answer(correct_answer(&common::question_bank()[0]));
    h.runtime.run_current().await;
    assert_eq!(
        next.latest(),
        AsyncResult::Failure(TrainingError::IllegalNavigation)
    );
    assert_eq!(
        submit.latest(),
        AsyncResult::Failure(TrainingError::SessionFinished)
    );
}

/// Ids of every question in a session, answering each correctly.
async fn question_order(seed: u64) -> Vec<String> {
    let mut h = harness(three_per_session(seed));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let mut ids = Vec::new();
    loop {
        let view = current(&h.progress);
        let Some(question) = view.question else {
            break;
        };
        ids.push(question.id().to_string());
        let _ = h.progress.submit_answer(correct_answer(&question));
        let _ = h.progress.move_to_next_question();
        h.runtime.run_current().await;
    }
    ids
}

#[tokio::test]
async fn same_seed_yields_same_questions() {
    for seed in [0, 2] {
        let first = question_order(seed).await;
        let second = question_order(seed).await;
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn seed_zero_starts_with_the_half_question() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    assert_eq!(question.id().as_str(), "question_id_1");
    assert!(question.content().html.contains("What fraction does 'half'"));

    let wrong = h
        .progress
        .submit_answer(UserAnswer::new(InteractionAnswer::NonNegativeInt(1)));
    h.runtime.run_current().await;
    let wrong = wrong.latest();
    let wrong = wrong.success().expect("classified");
    assert!(!wrong.is_correct_answer);
    assert!(wrong.feedback.html.is_empty());
    assert!(current(&h.progress).ephemeral_state.is_pending());

    let right = h
        .progress
        .submit_answer(UserAnswer::new(InteractionAnswer::NonNegativeInt(0)));
    h.runtime.run_current().await;
    let right = right.latest();
    let right = right.success().expect("classified");
    assert!(right.is_correct_answer);
    assert_eq!(right.feedback.html, CORRECT_FEEDBACK);
    assert!(current(&h.progress).ephemeral_state.is_completed());
}

#[tokio::test]
async fn seeds_pin_the_question_order() {
    assert_eq!(
        question_order(0).await,
        ["question_id_1", "question_id_2", "question_id_3"]
    );
    assert_eq!(
        question_order(2).await,
        ["question_id_0", "question_id_2", "question_id_4"]
    );
}

#[tokio::test]
async fn every_requested_skill_is_covered() {
    let mut h = harness(three_per_session(2));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let mut covered = Vec::new();
    loop {
        let view = current(&h.progress);
        let Some(question) = view.question else {
            break;
        };
        covered.extend(question.linked_skill_ids().iter().cloned());
        let _ = h.progress.submit_answer(correct_answer(&question));
        let _ = h.progress.move_to_next_question();
        h.runtime.run_current().await;
    }

    for id in [SKILL_0, SKILL_1, SKILL_2] {
        assert!(covered.contains(&skill(id)), "missing {id}");
    }
}

#[tokio::test]
async fn small_pool_uses_every_question() {
    let mut h = harness(TrainingConfig::new(10, 0));
    let _ = h.training.start_session(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    assert_eq!(current(&h.progress).total_question_count, 2);
}

#[tokio::test]
async fn stop_clears_current_question_and_allows_restart() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let _ = h.progress.submit_answer(correct_answer(&question));
    let _ = h.progress.move_to_next_question();
    h.runtime.run_current().await;
    assert_eq!(current(&h.progress).current_question_index, 1);

    let stop = h.training.stop_session();
    h.runtime.run_current().await;
    assert_eq!(stop.latest(), AsyncResult::Success(()));
    assert!(matches!(
        h.progress.get_current_question().latest(),
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));

    let restart = h.training.start_session(all_skills());
    h.runtime.run_current().await;
    assert_eq!(restart.latest(), AsyncResult::Success(()));
    let view = current(&h.progress);
    assert_eq!(view.current_question_index, 0);
    assert!(view.ephemeral_state.is_pending());
}

#[tokio::test]
async fn progress_issued_before_stop_is_cancelled() {
    let mut h = harness(three_per_session(0));
    let _ = h.training.start_session(all_skills());
    h.runtime.run_current().await;

    let question = current_question(&h.progress);
    let submit = h.progress.submit_answer(correct_answer(&question));
    let hint = h.progress.submit_hint_is_revealed(&question, true, 0);
    let stop = h.training.stop_session();
    h.runtime.run_current().await;

    assert_eq!(
        submit.latest().failure().map(ToString::to_string),
        Some("Cannot submit an answer if a training session has not yet begun.".to_string())
    );
    assert!(matches!(
        hint.latest(),
        AsyncResult::Failure(TrainingError::NoActiveSession(_))
    ));
    assert_eq!(stop.latest(), AsyncResult::Success(()));
    assert!(!h.runtime.has_active_session());
}

#[tokio::test]
async fn performance_reflects_completed_questions() {
    let mut h = harness(TrainingConfig::new(2, 0));
    let _ = h.training.start_session(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    // First question: one wrong answer before the correct one.
    let first = current_question(&h.progress);
    let _ = h.progress.submit_answer(wrong_answer(&first));
    let _ = h.progress.submit_answer(correct_answer(&first));
    let _ = h.progress.move_to_next_question();
    // Second question: answered correctly straight away.
    h.runtime.run_current().await;
    let second = current_question(&h.progress);
    let _ = h.progress.submit_answer(correct_answer(&second));
    let performance = h.progress.calculate_performance(vec![skill(SKILL_0)]);
    h.runtime.run_current().await;

    let performance = performance.latest();
    let performance = performance.success().expect("performance");
    assert_eq!(performance.total_fraction_score, FractionGrade::new(1.9, 2.0));
    assert_eq!(
        performance.fraction_score_per_skill.get(&skill(SKILL_0)),
        Some(&FractionGrade::new(1.9, 2.0))
    );
    // Skill 1 was not requested, so it is left out even though a question links it.
    assert!(!performance.fraction_score_per_skill.contains_key(&skill(SKILL_1)));
    let mastery = performance.mastery_per_skill[&skill(SKILL_0)];
    assert!((mastery - 0.15).abs() < 1e-9);
}
