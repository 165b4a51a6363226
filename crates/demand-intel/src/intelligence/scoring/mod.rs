mod policy;
mod rules;

pub use policy::{classify, route};
pub use rules::ScoreDimension;

use crate::intelligence::domain::{Classification, DecisionAction, ScoreFactors, SignalScores};
use crate::intelligence::settings::DecisionSettings;
use serde::{Deserialize, Serialize};

/// Stateless engine combining the pure score rules with the threshold
/// policy held in a freshly fetched settings snapshot.
pub struct ScoringEngine {
    settings: DecisionSettings,
}

impl ScoringEngine {
    pub fn new(settings: DecisionSettings) -> Self {
        Self { settings }
    }

    pub fn evaluate(&self, factors: &ScoreFactors) -> ScoreBreakdown {
        let (scores, components) = rules::score_factors(factors);
        let classification = policy::classify(scores.overall, &self.settings);
        let action = policy::route(
            scores.overall,
            factors.matching_suppliers_count,
            &self.settings,
        );

        ScoreBreakdown {
            scores,
            classification,
            action,
            components,
        }
    }
}

/// Per-dimension contribution, kept on the breakdown for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: ScoreDimension,
    pub score: f32,
    pub notes: String,
}

/// Full evaluation output for one set of score factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub scores: SignalScores,
    pub classification: Classification,
    pub action: DecisionAction,
    pub components: Vec<ScoreComponent>,
}
