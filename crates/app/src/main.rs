mod args;
mod input;
mod render;

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use practice_core::model::{EphemeralQuestion, Question};
use services::{EqualityClassifier, QuestionAssessmentProgressController, TrainingRuntime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::input::{Action, parse_action};

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let repository = args.open_repository().await?;

    let available = repository
        .skill_ids()
        .await
        .context("listing skills")?;
    if args.list_skills {
        for skill_id in &available {
            println!("{skill_id}");
        }
        return Ok(());
    }
    let skills = if args.skills.is_empty() {
        available
    } else {
        args.skills.clone()
    };

    let (runtime, controllers) =
        TrainingRuntime::builder(repository, Arc::new(EqualityClassifier))
            .with_config(args.training_config())
            .build();
    let runtime = runtime.spawn();
    let training = controllers.training;
    let progress = controllers.progress;

    training
        .start_session(skills.clone())
        .wait_for_result()
        .await
        .context("starting session")?;
    info!(skills = skills.len(), "practice session started");
    println!("{}", render::HELP);

    practice(&progress).await?;

    match progress
        .calculate_performance(skills)
        .wait_for_result()
        .await
    {
        Ok(performance) => print!("{}", render::performance(&performance)),
        Err(err) => eprintln!("could not score session: {err}"),
    }

    training
        .stop_session()
        .wait_for_result()
        .await
        .context("stopping session")?;
    drop(training);
    drop(progress);
    runtime.await.context("training runtime panicked")?;
    Ok(())
}

/// Read learner input until the session runs out of questions or they quit.
async fn practice(progress: &QuestionAssessmentProgressController) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw = true;

    loop {
        let view = progress
            .get_current_question()
            .wait_for_result()
            .await
            .context("reading current question")?;
        let Some(question) = view.question.clone() else {
            return Ok(());
        };
        if redraw {
            print!("{}", render::question(&view));
        }
        redraw = false;

        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let action = match parse_action(&line, &question) {
            Ok(action) => action,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match action {
            Action::Quit => return Ok(()),
            Action::Help => println!("{}", render::HELP),
            action => redraw = apply(progress, &view, &question, action).await,
        }
    }
}

/// Forward one action to the controller. Returns whether the question should be redrawn.
async fn apply(
    progress: &QuestionAssessmentProgressController,
    view: &EphemeralQuestion,
    question: &Question,
    action: Action,
) -> bool {
    let result = match action {
        Action::Answer(answer) => progress
            .submit_answer(answer)
            .wait_for_result()
            .await
            .map(|outcome| {
                let verdict = if outcome.is_correct_answer {
                    "Correct!"
                } else {
                    "Not quite."
                };
                let feedback = render::plain(&outcome.feedback);
                if feedback.is_empty() {
                    println!("{verdict}");
                } else {
                    println!("{verdict} {feedback}");
                }
                outcome.is_correct_answer
            }),
        Action::Hint(index) => progress
            .submit_hint_is_revealed(question, true, index)
            .wait_for_result()
            .await
            .map(|hint| {
                println!("hint {}: {}", index + 1, render::plain(&hint.hint_content));
                false
            }),
        Action::Solution => progress
            .submit_solution_is_revealed(question)
            .wait_for_result()
            .await
            .map(|solution| {
                println!("solution: {}", render::plain(&solution.explanation));
                false
            }),
        Action::Next if !view.ephemeral_state.is_completed() => {
            println!("answer the question before moving on");
            return false;
        }
        Action::Next => progress
            .move_to_next_question()
            .wait_for_result()
            .await
            .map(|()| true),
        Action::Help | Action::Quit => return false,
    };

    result.unwrap_or_else(|err| {
        println!("{err}");
        false
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
