use crate::intelligence::domain::{Classification, DecisionAction};
use crate::intelligence::settings::DecisionSettings;

/// Map an overall score to its demand classification.
///
/// Cut points are inclusive lower bounds: a boundary value takes the
/// higher-commitment label, and the mapping is monotonic in the score.
pub fn classify(overall: f32, settings: &DecisionSettings) -> Classification {
    if overall >= settings.buy_classification_min_score {
        Classification::Buy
    } else if overall >= settings.research_classification_min_score {
        Classification::Research
    } else {
        Classification::Noise
    }
}

/// Route a classified signal to its decision action.
///
/// The supplier-availability gate takes precedence over the score bands: a
/// signal that cannot be fulfilled goes to admin review no matter how well
/// it scored.
pub fn route(
    overall: f32,
    matching_suppliers_count: u32,
    settings: &DecisionSettings,
) -> DecisionAction {
    if settings.require_supplier_availability
        && matching_suppliers_count < settings.min_matching_suppliers
    {
        return DecisionAction::AdminReview;
    }

    if overall >= settings.auto_rfq_min_score {
        DecisionAction::AutoRfq
    } else if overall >= settings.admin_review_min_score {
        DecisionAction::AdminReview
    } else {
        DecisionAction::Ignore
    }
}
