use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use practice_core::model::SkillId;
use services::TrainingConfig;
use storage::bank::QuestionBank;
use storage::repository::{InMemoryRepository, QuestionRepository, Storage};

const SAMPLE_BANK: &str = include_str!("../assets/sample_bank.json");

/// Practice questions for a set of skills in the terminal.
#[derive(Debug, Parser)]
#[command(name = "practice", version)]
pub struct Args {
    /// `SQLite` question bank, as written by the `seed` tool.
    #[arg(long, env = "PRACTICE_DB_URL", conflicts_with = "bank")]
    pub db: Option<String>,

    /// JSON question bank file. The bundled sample bank is used when neither
    /// this nor `--db` is given.
    #[arg(long, env = "PRACTICE_QUESTION_BANK")]
    pub bank: Option<PathBuf>,

    /// Skill to practice. Repeat for several skills; defaults to every skill in the bank.
    #[arg(long = "skill", value_name = "SKILL_ID")]
    pub skills: Vec<SkillId>,

    #[arg(long, env = "PRACTICE_QUESTIONS_PER_SESSION", default_value_t = 10)]
    pub questions_per_session: usize,

    #[arg(long, env = "PRACTICE_TRAINING_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Print the skills available in the bank and exit.
    #[arg(long)]
    pub list_skills: bool,
}

impl Args {
    #[must_use]
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::new(self.questions_per_session, self.seed)
    }

    /// Open whichever question bank the flags point at.
    pub async fn open_repository(&self) -> anyhow::Result<Arc<dyn QuestionRepository>> {
        if let Some(db) = &self.db {
            let url = normalize_sqlite_url(db);
            let storage = Storage::sqlite(&url)
                .await
                .with_context(|| format!("opening {url}"))?;
            return Ok(storage.questions);
        }

        let bank = match &self.bank {
            Some(path) => {
                QuestionBank::load(path).with_context(|| format!("loading {}", path.display()))?
            }
            None => QuestionBank::from_json_str(SAMPLE_BANK).context("parsing sample bank")?,
        };
        Ok(Arc::new(InMemoryRepository::with_questions(
            bank.into_questions(),
        )))
    }
}

/// Turn relative `sqlite:` paths into absolute `sqlite://` URLs.
fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
