use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored demand signals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(pub String);

/// Identifier for a materialized internal requirement (RFQ).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementId(pub String);

/// Where a candidate opportunity was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    MarketScan,
    InboundInquiry,
    PartnerFeed,
    ManualEntry,
}

/// Buyer qualification level known at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyerType {
    VerifiedBusiness,
    RegisteredBusiness,
    Guest,
}

/// Raw opportunity attributes consumed by the score calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub estimated_value: f64,
    pub category: String,
    pub subcategory: Option<String>,
    pub industry: Option<String>,
    pub country: String,
    pub delivery_timeline_days: u32,
    pub buyer_type: BuyerType,
    pub matching_suppliers_count: u32,
    pub avg_supplier_match_score: Option<f32>,
}

/// The four sub-scores plus their rounded mean, all on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub intent: f32,
    pub urgency: f32,
    pub value: f32,
    pub feasibility: f32,
    pub overall: f32,
}

/// Discrete demand classification derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Buy,
    Research,
    Noise,
}

impl Classification {
    pub const fn label(self) -> &'static str {
        match self {
            Classification::Buy => "buy",
            Classification::Research => "research",
            Classification::Noise => "noise",
        }
    }
}

/// Routing outcome for a classified signal.
///
/// `Pending` is the only initial state. Automatic routing moves a signal to
/// exactly one of the other three; `AdminReview` may afterwards be escalated
/// to `AutoRfq` or dismissed to `Ignore` by an explicit admin action. A
/// signal holding a requirement link is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Pending,
    AutoRfq,
    AdminReview,
    Ignore,
}

impl DecisionAction {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionAction::Pending => "pending",
            DecisionAction::AutoRfq => "auto_rfq",
            DecisionAction::AdminReview => "admin_review",
            DecisionAction::Ignore => "ignore",
        }
    }
}

/// Inbound payload describing a detected opportunity before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSubmission {
    pub source: SignalSource,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_value: f64,
    pub delivery_location: String,
    pub delivery_timeline_days: u32,
    pub buyer_type: BuyerType,
    /// Supplier availability, when the detector already looked it up.
    /// Omitted counts are resolved through the supplier directory at ingest.
    #[serde(default)]
    pub matching_suppliers_count: Option<u32>,
    #[serde(default)]
    pub best_supplier_match_score: Option<f32>,
    #[serde(default)]
    pub avg_supplier_match_score: Option<f32>,
}

/// Stored demand signal, retained indefinitely as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSignal {
    pub id: SignalId,
    pub source: SignalSource,
    pub detected_at: DateTime<Utc>,
    pub classification: Classification,
    pub scores: SignalScores,
    pub category: String,
    pub subcategory: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub estimated_value: f64,
    pub delivery_location: String,
    pub delivery_timeline_days: u32,
    pub buyer_type: BuyerType,
    pub matching_suppliers_count: u32,
    pub best_supplier_match_score: Option<f32>,
    pub fulfilment_feasible: bool,
    pub decision_action: DecisionAction,
    pub converted_to_rfq_id: Option<RequirementId>,
}

impl DemandSignal {
    /// Whether an explicit admin decision can still change this signal.
    pub fn accepts_manual_override(&self) -> bool {
        self.decision_action == DecisionAction::AdminReview && self.converted_to_rfq_id.is_none()
    }
}

/// Internal sourcing requirement created when a signal is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub id: RequirementId,
    pub source_signal_id: SignalId,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub estimated_value: f64,
    pub delivery_location: String,
    pub delivery_timeline_days: u32,
    pub created_at: DateTime<Utc>,
}
