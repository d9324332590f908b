use std::collections::HashSet;
use std::path::Path;

use practice_core::model::{Question, QuestionId};
use serde::Deserialize;
use thiserror::Error;

use crate::repository::{QuestionRepository, StorageError};

/// A question bank file: a JSON document holding every question to import.
///
/// ```json
/// { "questions": [ { "id": "q0", "content": {"html": "..."}, ... } ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question {0} appears more than once")]
    DuplicateId(QuestionId),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuestionBank {
    /// Parse a bank from JSON text. Every question is validated on the way in.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Parse` for malformed or invalid questions and
    /// `BankError::DuplicateId` when two questions share an id.
    pub fn from_json_str(raw: &str) -> Result<Self, BankError> {
        let bank: Self = serde_json::from_str(raw)?;
        let mut seen = HashSet::new();
        for question in &bank.questions {
            if !seen.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id().clone()));
            }
        }
        Ok(bank)
    }

    /// Read and parse a bank file.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }

    /// Upsert every question into `repo`, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` on the first failed write.
    pub async fn import_into(&self, repo: &dyn QuestionRepository) -> Result<usize, BankError> {
        for question in &self.questions {
            repo.upsert_question(question).await?;
        }
        Ok(self.questions.len())
    }
}
