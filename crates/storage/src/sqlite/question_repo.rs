use std::collections::HashSet;

use chrono::Utc;
use practice_core::model::{Question, QuestionId, SkillId};

use super::SqliteRepository;
use super::mapping::{map_question_row, map_skill_row, question_id_param, question_payload};
use crate::repository::{QuestionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let id = question_id_param(question.id());
        let payload = question_payload(question)?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO questions (id, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&id)
        .bind(payload)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM question_skills WHERE question_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, skill_id) in question.linked_skill_ids().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO question_skills (question_id, skill_id, position)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(question_id, skill_id) DO NOTHING
                ",
            )
            .bind(&id)
            .bind(skill_id.as_str())
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query("SELECT id, payload FROM questions WHERE id = ?1")
            .bind(question_id_param(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => map_question_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn questions_for_skills(
        &self,
        skill_ids: &[SkillId],
    ) -> Result<Vec<Question>, StorageError> {
        let mut seen: HashSet<QuestionId> = HashSet::new();
        let mut found = Vec::new();

        for skill_id in skill_ids {
            let rows = sqlx::query(
                r"
                SELECT q.id, q.payload
                FROM questions q
                JOIN question_skills s ON s.question_id = q.id
                WHERE s.skill_id = ?1
                ORDER BY q.id ASC
                ",
            )
            .bind(skill_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

            for row in rows {
                let question = map_question_row(&row)?;
                if seen.insert(question.id().clone()) {
                    found.push(question);
                }
            }
        }

        Ok(found)
    }

    async fn skill_ids(&self) -> Result<Vec<SkillId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT skill_id
            FROM question_skills
            ORDER BY skill_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_skill_row).collect()
    }
}
