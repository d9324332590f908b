use async_trait::async_trait;
use practice_core::model::{Question, QuestionId, SkillId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read access to the question bank, plus the writes needed to fill it.
///
/// Questions returned by `questions_for_skills` are grouped by skill in the
/// order the skills were requested, ordered by question id within a skill, and
/// never repeated even when linked to several requested skills.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or replace a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError>;

    /// All questions linked to any of the given skills.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. Unknown skills yield no questions.
    async fn questions_for_skills(
        &self,
        skill_ids: &[SkillId],
    ) -> Result<Vec<Question>, StorageError>;

    /// Every skill that has at least one question, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn skill_ids(&self) -> Result<Vec<SkillId>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            questions: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Build a repository already holding `questions`.
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let map = questions
            .into_iter()
            .map(|q| (q.id().clone(), q))
            .collect();
        Self {
            questions: Arc::new(Mutex::new(map)),
        }
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id().clone(), question.clone());
        Ok(())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn questions_for_skills(
        &self,
        skill_ids: &[SkillId],
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut seen: HashSet<&QuestionId> = HashSet::new();
        let mut found = Vec::new();
        for skill_id in skill_ids {
            for question in guard.values().filter(|q| q.is_linked_to(skill_id)) {
                if seen.insert(question.id()) {
                    found.push(question.clone());
                }
            }
        }
        Ok(found)
    }

    async fn skill_ids(&self) -> Result<Vec<SkillId>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let skills: BTreeSet<SkillId> = guard
            .values()
            .flat_map(|q| q.linked_skill_ids().iter().cloned())
            .collect();
        Ok(skills.into_iter().collect())
    }
}

/// Holds the question bank behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(InMemoryRepository::new());
        Self { questions }
    }
}
