use super::ScoreComponent;
use crate::intelligence::domain::{BuyerType, ScoreFactors, SignalScores};

const SCORE_MIN: f32 = 0.0;
const SCORE_MAX: f32 = 10.0;

pub(crate) fn clamp_score(value: f32) -> f32 {
    if !value.is_finite() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

pub(crate) fn round_one_decimal(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Which dimension a score component contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    Intent,
    Urgency,
    Value,
    Feasibility,
}

pub(crate) fn score_factors(factors: &ScoreFactors) -> (SignalScores, Vec<ScoreComponent>) {
    let mut components = Vec::with_capacity(4);

    let intent = intent_score(factors);
    components.push(ScoreComponent {
        dimension: ScoreDimension::Intent,
        score: intent,
        notes: format!(
            "{:?} buyer, subcategory {}, industry {}",
            factors.buyer_type,
            presence(factors.subcategory.as_deref()),
            presence(factors.industry.as_deref()),
        ),
    });

    let urgency = urgency_score(factors.delivery_timeline_days);
    components.push(ScoreComponent {
        dimension: ScoreDimension::Urgency,
        score: urgency,
        notes: format!("delivery window {} day(s)", factors.delivery_timeline_days),
    });

    let value = value_score(factors.estimated_value);
    components.push(ScoreComponent {
        dimension: ScoreDimension::Value,
        score: value,
        notes: format!("estimated deal value {:.0}", factors.estimated_value.max(0.0)),
    });

    let feasibility = feasibility_score(
        factors.matching_suppliers_count,
        factors.avg_supplier_match_score,
    );
    components.push(ScoreComponent {
        dimension: ScoreDimension::Feasibility,
        score: feasibility,
        notes: match factors.avg_supplier_match_score {
            Some(avg) => format!(
                "{} matching supplier(s), avg match {:.1}",
                factors.matching_suppliers_count,
                clamp_score(avg)
            ),
            None => format!(
                "{} matching supplier(s), no match history",
                factors.matching_suppliers_count
            ),
        },
    });

    let overall = round_one_decimal((intent + urgency + value + feasibility) / 4.0);

    let scores = SignalScores {
        intent,
        urgency,
        value,
        feasibility,
        overall,
    };

    (scores, components)
}

fn presence(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.trim().is_empty() => "given",
        _ => "missing",
    }
}

/// Buyer qualification carries most of the intent weight; a fully specified
/// category path signals a buyer who knows what they want.
fn intent_score(factors: &ScoreFactors) -> f32 {
    let base = match factors.buyer_type {
        BuyerType::VerifiedBusiness => 8.0,
        BuyerType::RegisteredBusiness => 6.0,
        BuyerType::Guest => 3.0,
    };

    let mut score = base;
    if matches!(factors.subcategory.as_deref(), Some(v) if !v.trim().is_empty()) {
        score += 1.0;
    }
    if matches!(factors.industry.as_deref(), Some(v) if !v.trim().is_empty()) {
        score += 1.0;
    }

    clamp_score(score)
}

fn urgency_score(delivery_timeline_days: u32) -> f32 {
    let score = match delivery_timeline_days {
        0..=7 => 10.0,
        8..=14 => 8.5,
        15..=30 => 7.0,
        31..=60 => 5.0,
        61..=90 => 3.5,
        _ => 2.0,
    };
    clamp_score(score)
}

fn value_score(estimated_value: f64) -> f32 {
    let score = if estimated_value >= 1_000_000.0 {
        10.0
    } else if estimated_value >= 250_000.0 {
        8.5
    } else if estimated_value >= 50_000.0 {
        7.0
    } else if estimated_value >= 10_000.0 {
        5.5
    } else if estimated_value >= 1_000.0 {
        4.0
    } else if estimated_value > 0.0 {
        2.5
    } else {
        0.0
    };
    clamp_score(score)
}

/// Supplier depth saturates at five matches; historical match quality tops
/// up the remaining four points.
fn feasibility_score(matching_suppliers_count: u32, avg_supplier_match_score: Option<f32>) -> f32 {
    let depth = (matching_suppliers_count.min(5) as f32) * 1.2;
    let quality = avg_supplier_match_score
        .map(|avg| clamp_score(avg) * 0.4)
        .unwrap_or(0.0);
    clamp_score(depth + quality)
}
