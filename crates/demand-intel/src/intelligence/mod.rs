//! Demand-signal scoring, classification, decision routing, and RFQ
//! materialization for the admin demand-intelligence surface.

pub mod domain;
pub mod metrics;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod settings;

pub use domain::{
    BuyerType, Classification, DecisionAction, DemandSignal, RequirementId, RequirementRecord,
    ScoreFactors, SignalId, SignalScores, SignalSource, SignalSubmission,
};
pub use metrics::IntelligenceMetrics;
pub use repository::{
    DirectoryError, RepositoryError, SettingsStore, SignalQuery, SignalRepository, SignalView,
    SupplierAvailability, SupplierDirectory,
};
pub use router::intelligence_router;
pub use scoring::{ScoreBreakdown, ScoreComponent, ScoreDimension, ScoringEngine};
pub use service::{DemandIntelligenceService, IntelligenceServiceError};
pub use settings::{DecisionSettings, SettingsValidationError};
