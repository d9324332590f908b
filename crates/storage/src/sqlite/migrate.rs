use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Schema versions in order. Each version's statements run in one transaction.
const MIGRATIONS: &[(i64, &[&str])] = &[(
    1,
    &[
        r"
            CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY NOT NULL CHECK (length(trim(id)) > 0),
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        ",
        r"
            CREATE TABLE IF NOT EXISTS question_skills (
                question_id TEXT NOT NULL,
                skill_id TEXT NOT NULL,
                position INTEGER NOT NULL CHECK (position >= 0),
                PRIMARY KEY (question_id, skill_id),
                FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
            );
        ",
        r"
            CREATE INDEX IF NOT EXISTS idx_question_skills_skill
                ON question_skills (skill_id, question_id);
        ",
    ],
)];

/// Applies every migration newer than the recorded schema version.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    let current: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    let current = current.unwrap_or(0);

    for &(version, statements) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let mut tx = pool.begin().await?;
        for &statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(version)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}
