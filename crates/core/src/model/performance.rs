use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::SkillId;

/// Points earned out of points available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FractionGrade {
    pub points_received: f64,
    pub total_points_available: f64,
}

impl FractionGrade {
    #[must_use]
    pub fn new(points_received: f64, total_points_available: f64) -> Self {
        Self {
            points_received,
            total_points_available,
        }
    }
}

/// How the learner did over one training session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAssessmentPerformance {
    pub total_fraction_score: FractionGrade,
    pub fraction_score_per_skill: BTreeMap<SkillId, FractionGrade>,
    /// Signed mastery change per skill, within `[-0.1, 0.1]` per question.
    pub mastery_per_skill: BTreeMap<SkillId, f64>,
}
