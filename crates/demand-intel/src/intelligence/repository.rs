use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Classification, DecisionAction, DemandSignal, RequirementId, RequirementRecord, SignalId,
    SignalScores,
};
use super::settings::DecisionSettings;

/// Storage abstraction over the signal and requirement tables so the service
/// can be exercised against in-memory doubles.
///
/// `set_action` and `link_requirement` are conditional writes: the store is
/// the serialization point for concurrent admin decisions, so both fail with
/// [`RepositoryError::Conflict`] instead of overwriting.
pub trait SignalRepository: Send + Sync {
    fn insert(&self, signal: DemandSignal) -> Result<DemandSignal, RepositoryError>;
    fn fetch(&self, id: &SignalId) -> Result<Option<DemandSignal>, RepositoryError>;
    fn list(&self, query: &SignalQuery) -> Result<Vec<DemandSignal>, RepositoryError>;
    /// Compare-and-set on `decision_action`.
    fn set_action(
        &self,
        id: &SignalId,
        from: DecisionAction,
        to: DecisionAction,
    ) -> Result<(), RepositoryError>;
    /// Atomically store the requirement, set `converted_to_rfq_id`, and move
    /// `decision_action` to auto-RFQ; fails with `Conflict` when a link
    /// already exists or the signal has left the admin-review/auto-RFQ
    /// states, so a racing dismissal wins over a stale approval.
    fn link_requirement(
        &self,
        id: &SignalId,
        requirement: RequirementRecord,
    ) -> Result<RequirementRecord, RepositoryError>;
    fn fetch_requirement(
        &self,
        id: &RequirementId,
    ) -> Result<Option<RequirementRecord>, RepositoryError>;
}

/// Settings singleton access. The router reads through this on every
/// classification; a load failure fails the classification.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<DecisionSettings, RepositoryError>;
    fn save(&self, settings: DecisionSettings) -> Result<(), RepositoryError>;
}

/// Supplier-availability lookup keyed by (category, subcategory, country).
pub trait SupplierDirectory: Send + Sync {
    fn availability(
        &self,
        category: &str,
        subcategory: Option<&str>,
        country: &str,
    ) -> Result<SupplierAvailability, DirectoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SupplierAvailability {
    pub matching_count: u32,
    pub best_match_score: Option<f32>,
    pub avg_match_score: Option<f32>,
}

/// Filter/ranking parameters for signal listings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignalQuery {
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub action: Option<DecisionAction>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub min_overall: Option<f32>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SignalQuery {
    pub fn matches(&self, signal: &DemandSignal) -> bool {
        if let Some(classification) = self.classification {
            if signal.classification != classification {
                return false;
            }
        }
        if let Some(action) = self.action {
            if signal.decision_action != action {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !signal.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if !signal.delivery_location.eq_ignore_ascii_case(country) {
                return false;
            }
        }
        if let Some(min_overall) = self.min_overall {
            if signal.scores.overall < min_overall {
                return false;
            }
        }
        true
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was concurrently decided")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Supplier directory failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("supplier directory unavailable: {0}")]
    Unavailable(String),
}

/// Wire representation of a stored signal for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalView {
    pub signal_id: SignalId,
    pub detected_at: DateTime<Utc>,
    pub classification: &'static str,
    pub scores: SignalScores,
    pub category: String,
    pub delivery_location: String,
    pub estimated_value: f64,
    pub matching_suppliers_count: u32,
    pub fulfilment_feasible: bool,
    pub decision_action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_to_rfq_id: Option<RequirementId>,
}

impl SignalView {
    pub fn from_signal(signal: &DemandSignal) -> Self {
        Self {
            signal_id: signal.id.clone(),
            detected_at: signal.detected_at,
            classification: signal.classification.label(),
            scores: signal.scores,
            category: signal.category.clone(),
            delivery_location: signal.delivery_location.clone(),
            estimated_value: signal.estimated_value,
            matching_suppliers_count: signal.matching_suppliers_count,
            fulfilment_feasible: signal.fulfilment_feasible,
            decision_action: signal.decision_action.label(),
            converted_to_rfq_id: signal.converted_to_rfq_id.clone(),
        }
    }
}
