use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use storage::bank::QuestionBank;
use storage::repository::Storage;

/// Import a JSON question bank into a `SQLite` database.
#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Args {
    /// `SQLite` URL to write into.
    #[arg(long, env = "PRACTICE_DB_URL", default_value = "sqlite:practice.sqlite3?mode=rwc")]
    db: String,

    /// Path to the question bank JSON file.
    #[arg(long, env = "PRACTICE_QUESTION_BANK")]
    bank: PathBuf,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let bank = QuestionBank::load(&args.bank)
        .with_context(|| format!("loading {}", args.bank.display()))?;

    let storage = Storage::sqlite(&args.db)
        .await
        .with_context(|| format!("opening {}", args.db))?;

    let written = bank.import_into(storage.questions.as_ref()).await?;
    let skills = storage.questions.skill_ids().await?;

    println!(
        "Seeded {written} questions covering {} skills into {}",
        skills.len(),
        args.db
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
