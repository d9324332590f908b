use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use practice_core::model::{Question, SkillId};

use crate::config::TrainingConfig;
use crate::error::TrainingError;

/// Orders and caps the candidate questions for one session.
pub trait SelectionStrategy: Send + Sync {
    /// `candidates` are unique by id and grouped by skill in request order.
    fn select(
        &self,
        skill_ids: &[SkillId],
        candidates: Vec<Question>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Vec<Question>;
}

/// Shuffles every skill's pool, then picks one question per skill in turn
/// until the limit is reached, then shuffles the picked set.
///
/// Each question belongs to the first requested skill it is linked to, so a
/// question shared by two skills is only drawn once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinBySkill;

impl SelectionStrategy for RoundRobinBySkill {
    fn select(
        &self,
        skill_ids: &[SkillId],
        candidates: Vec<Question>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Vec<Question> {
        let mut pools: Vec<Vec<Question>> = vec![Vec::new(); skill_ids.len()];
        for question in candidates {
            if let Some(slot) = skill_ids.iter().position(|s| question.is_linked_to(s)) {
                pools[slot].push(question);
            }
        }

        let mut pools: Vec<VecDeque<Question>> = pools
            .into_iter()
            .map(|mut pool| {
                pool.shuffle(rng);
                VecDeque::from(pool)
            })
            .collect();

        let mut picked = Vec::new();
        while picked.len() < limit && pools.iter().any(|pool| !pool.is_empty()) {
            for pool in &mut pools {
                if picked.len() >= limit {
                    break;
                }
                if let Some(question) = pool.pop_front() {
                    picked.push(question);
                }
            }
        }

        picked.shuffle(rng);
        picked
    }
}

/// Shuffles the whole pool and keeps the first `limit` questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleThenTruncate;

impl SelectionStrategy for ShuffleThenTruncate {
    fn select(
        &self,
        _skill_ids: &[SkillId],
        mut candidates: Vec<Question>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Vec<Question> {
        candidates.shuffle(rng);
        candidates.truncate(limit);
        candidates
    }
}

/// Builds the ordered question list for a new training session.
#[derive(Clone)]
pub struct QuestionSelector {
    config: TrainingConfig,
    strategy: Arc<dyn SelectionStrategy>,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            strategy: Arc::new(RoundRobinBySkill),
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn config(&self) -> TrainingConfig {
        self.config
    }

    /// Select up to `questions_per_session` questions for `skill_ids`.
    ///
    /// Fewer candidates than the limit yields all of them.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidRequest` if nothing can be selected.
    pub fn select(
        &self,
        skill_ids: &[SkillId],
        candidates: impl IntoIterator<Item = Question>,
    ) -> Result<Vec<Question>, TrainingError> {
        if skill_ids.is_empty() {
            return Err(TrainingError::InvalidRequest);
        }

        let mut seen = HashSet::new();
        let unique: Vec<Question> = candidates
            .into_iter()
            .filter(|q| skill_ids.iter().any(|s| q.is_linked_to(s)))
            .filter(|q| seen.insert(q.id().clone()))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.training_seed);
        let selected = self.strategy.select(
            skill_ids,
            unique,
            self.config.questions_per_session,
            &mut rng,
        );

        if selected.is_empty() {
            return Err(TrainingError::InvalidRequest);
        }
        Ok(selected)
    }
}

impl std::fmt::Debug for QuestionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionSelector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
