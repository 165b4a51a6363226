use serde::{Deserialize, Serialize};

use super::domain::{Classification, DecisionAction, DemandSignal};

/// On-demand aggregate over the stored signal set. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceMetrics {
    pub total_signals: usize,
    pub buy_signals: usize,
    pub research_signals: usize,
    pub noise_signals: usize,
    pub pending: usize,
    pub auto_rfq: usize,
    pub admin_review: usize,
    pub ignored: usize,
    pub converted_to_rfq: usize,
    /// Share of signals that ended up as auto-RFQ, in [0, 1].
    pub auto_rfq_rate: f64,
    pub mean_overall_score: f64,
}

impl IntelligenceMetrics {
    pub fn compute(signals: &[DemandSignal]) -> Self {
        let total = signals.len();
        let count_class = |c: Classification| {
            signals
                .iter()
                .filter(|signal| signal.classification == c)
                .count()
        };
        let count_action = |a: DecisionAction| {
            signals
                .iter()
                .filter(|signal| signal.decision_action == a)
                .count()
        };

        let auto_rfq = count_action(DecisionAction::AutoRfq);
        let converted = signals
            .iter()
            .filter(|signal| signal.converted_to_rfq_id.is_some())
            .count();

        let auto_rfq_rate = if total == 0 {
            0.0
        } else {
            auto_rfq as f64 / total as f64
        };

        let mean_overall_score = if total == 0 {
            0.0
        } else {
            signals
                .iter()
                .map(|signal| signal.scores.overall as f64)
                .sum::<f64>()
                / total as f64
        };

        Self {
            total_signals: total,
            buy_signals: count_class(Classification::Buy),
            research_signals: count_class(Classification::Research),
            noise_signals: count_class(Classification::Noise),
            pending: count_action(DecisionAction::Pending),
            auto_rfq,
            admin_review: count_action(DecisionAction::AdminReview),
            ignored: count_action(DecisionAction::Ignore),
            converted_to_rfq: converted,
            auto_rfq_rate,
            mean_overall_score,
        }
    }
}
