use serde::{Deserialize, Serialize};

/// Tunables for building training sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Upper bound on questions selected for one session.
    pub questions_per_session: usize,
    /// Seed for question selection. The same seed over the same question
    /// pool always yields the same session.
    pub training_seed: u64,
}

impl TrainingConfig {
    #[must_use]
    pub fn new(questions_per_session: usize, training_seed: u64) -> Self {
        Self {
            questions_per_session,
            training_seed,
        }
    }

    #[must_use]
    pub fn with_questions_per_session(mut self, questions_per_session: usize) -> Self {
        self.questions_per_session = questions_per_session;
        self
    }

    #[must_use]
    pub fn with_training_seed(mut self, training_seed: u64) -> Self {
        self.training_seed = training_seed;
        self
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            questions_per_session: 10,
            training_seed: 0,
        }
    }
}
