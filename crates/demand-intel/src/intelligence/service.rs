use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    DecisionAction, DemandSignal, RequirementId, RequirementRecord, ScoreFactors, SignalId,
    SignalSubmission,
};
use super::metrics::IntelligenceMetrics;
use super::repository::{
    DirectoryError, RepositoryError, SettingsStore, SignalQuery, SignalRepository,
    SupplierAvailability, SupplierDirectory,
};
use super::scoring::ScoringEngine;
use super::settings::{DecisionSettings, SettingsValidationError};

static SIGNAL_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REQUIREMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_signal_id() -> SignalId {
    let id = SIGNAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SignalId(format!("sig-{id:06}"))
}

fn next_requirement_id() -> RequirementId {
    let id = REQUIREMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequirementId(format!("rfq-{id:06}"))
}

/// Service composing the signal store, settings store, and supplier
/// directory behind the demand-intelligence operations.
pub struct DemandIntelligenceService<R, S, P> {
    repository: Arc<R>,
    settings: Arc<S>,
    directory: Arc<P>,
}

impl<R, S, P> DemandIntelligenceService<R, S, P>
where
    R: SignalRepository + 'static,
    S: SettingsStore + 'static,
    P: SupplierDirectory + 'static,
{
    pub fn new(repository: Arc<R>, settings: Arc<S>, directory: Arc<P>) -> Self {
        Self {
            repository,
            settings,
            directory,
        }
    }

    /// Score, classify, and route a detected opportunity, persisting the
    /// resulting signal. Signals routed to auto-RFQ are materialized in the
    /// same call; if that materialization fails the signal stays in the
    /// admin-review queue and is recovered through [`Self::approve`], not by
    /// resubmitting.
    ///
    /// Settings are fetched fresh; if the settings store is unavailable the
    /// whole ingestion fails rather than classifying against stale or
    /// default thresholds.
    pub fn ingest(
        &self,
        submission: SignalSubmission,
    ) -> Result<DemandSignal, IntelligenceServiceError> {
        let settings = self.settings.load()?;

        if !settings.category_enabled(&submission.category) {
            return Err(IntelligenceServiceError::CategoryNotEnabled(
                submission.category,
            ));
        }
        if !settings.country_enabled(&submission.delivery_location) {
            return Err(IntelligenceServiceError::CountryNotEnabled(
                submission.delivery_location,
            ));
        }

        let availability = self.resolve_availability(&submission)?;

        let factors = ScoreFactors {
            estimated_value: submission.estimated_value,
            category: submission.category.clone(),
            subcategory: submission.subcategory.clone(),
            industry: submission.industry.clone(),
            country: submission.delivery_location.clone(),
            delivery_timeline_days: submission.delivery_timeline_days,
            buyer_type: submission.buyer_type,
            matching_suppliers_count: availability.matching_count,
            avg_supplier_match_score: availability.avg_match_score,
        };

        let breakdown = ScoringEngine::new(settings.clone()).evaluate(&factors);
        let routed_action = breakdown.action;

        // Auto-RFQ routed signals are stored in the review state first; the
        // flip to auto-RFQ rides the conditional link write, so a failed
        // materialization leaves a reviewable signal rather than a
        // conversion with no requirement behind it.
        let initial_action = match routed_action {
            DecisionAction::AutoRfq => DecisionAction::AdminReview,
            action => action,
        };

        let signal = DemandSignal {
            id: next_signal_id(),
            source: submission.source,
            detected_at: Utc::now(),
            classification: breakdown.classification,
            scores: breakdown.scores,
            category: submission.category,
            subcategory: submission.subcategory,
            industry: submission.industry,
            description: submission.description,
            estimated_value: submission.estimated_value,
            delivery_location: submission.delivery_location,
            delivery_timeline_days: submission.delivery_timeline_days,
            buyer_type: submission.buyer_type,
            matching_suppliers_count: availability.matching_count,
            best_supplier_match_score: availability.best_match_score,
            fulfilment_feasible: availability.matching_count >= settings.min_matching_suppliers,
            decision_action: initial_action,
            converted_to_rfq_id: None,
        };

        let stored = self.repository.insert(signal)?;
        info!(
            signal_id = %stored.id.0,
            classification = stored.classification.label(),
            action = routed_action.label(),
            overall = stored.scores.overall,
            "demand signal routed"
        );

        if routed_action == DecisionAction::AutoRfq {
            let requirement = self.materialize(&stored)?;
            let linked = self
                .repository
                .fetch(&stored.id)?
                .ok_or(RepositoryError::NotFound)?;
            info!(
                signal_id = %linked.id.0,
                requirement_id = %requirement.id.0,
                "signal auto-converted to requirement"
            );
            return Ok(linked);
        }

        Ok(stored)
    }

    /// Ranked, filterable listing: overall score descending, newest first on
    /// ties.
    pub fn list(&self, query: &SignalQuery) -> Result<Vec<DemandSignal>, IntelligenceServiceError> {
        let mut signals = self.repository.list(query)?;
        signals.sort_by(|a, b| {
            b.scores
                .overall
                .total_cmp(&a.scores.overall)
                .then(b.detected_at.cmp(&a.detected_at))
        });
        if let Some(limit) = query.limit {
            signals.truncate(limit);
        }
        Ok(signals)
    }

    /// Manual escalation of an admin-review signal to auto-RFQ, including
    /// materialization. Approving a signal that already holds a requirement
    /// link returns the existing requirement unchanged.
    pub fn approve(
        &self,
        id: &SignalId,
    ) -> Result<(DemandSignal, RequirementRecord), IntelligenceServiceError> {
        let signal = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(requirement_id) = &signal.converted_to_rfq_id {
            let existing = self
                .repository
                .fetch_requirement(requirement_id)?
                .ok_or(RepositoryError::NotFound)?;
            return Ok((signal, existing));
        }

        match signal.decision_action {
            // The action flip to auto-RFQ rides on the conditional link
            // write, so a failed materialization leaves the signal exactly
            // as it was.
            DecisionAction::AutoRfq | DecisionAction::AdminReview => {}
            from => {
                return Err(IntelligenceServiceError::InvalidTransition {
                    from,
                    requested: DecisionAction::AutoRfq,
                })
            }
        }

        let requirement = self.materialize(&signal)?;
        let signal = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        info!(signal_id = %id.0, requirement_id = %requirement.id.0, "signal approved");
        Ok((signal, requirement))
    }

    /// Manual dismissal of an admin-review signal.
    pub fn dismiss(&self, id: &SignalId) -> Result<DemandSignal, IntelligenceServiceError> {
        let signal = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if !signal.accepts_manual_override() {
            return Err(IntelligenceServiceError::InvalidTransition {
                from: signal.decision_action,
                requested: DecisionAction::Ignore,
            });
        }

        self.repository
            .set_action(id, DecisionAction::AdminReview, DecisionAction::Ignore)?;
        info!(signal_id = %id.0, "signal dismissed");
        self.repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)
            .map_err(Into::into)
    }

    pub fn metrics(&self) -> Result<IntelligenceMetrics, IntelligenceServiceError> {
        let signals = self.repository.list(&SignalQuery::default())?;
        Ok(IntelligenceMetrics::compute(&signals))
    }

    pub fn settings(&self) -> Result<DecisionSettings, IntelligenceServiceError> {
        self.settings.load().map_err(Into::into)
    }

    pub fn update_settings(
        &self,
        settings: DecisionSettings,
    ) -> Result<DecisionSettings, IntelligenceServiceError> {
        settings.validate()?;
        self.settings.save(settings.clone())?;
        info!("decision settings updated");
        Ok(settings)
    }

    fn resolve_availability(
        &self,
        submission: &SignalSubmission,
    ) -> Result<SupplierAvailability, IntelligenceServiceError> {
        if let Some(count) = submission.matching_suppliers_count {
            return Ok(SupplierAvailability {
                matching_count: count,
                best_match_score: submission.best_supplier_match_score,
                avg_match_score: submission.avg_supplier_match_score,
            });
        }

        self.directory
            .availability(
                &submission.category,
                submission.subcategory.as_deref(),
                &submission.delivery_location,
            )
            .map_err(Into::into)
    }

    /// Create the requirement record for a signal and link it back. The
    /// store write is conditional on no existing link, so a concurrent
    /// materialization loses cleanly and the winner's record is returned.
    fn materialize(
        &self,
        signal: &DemandSignal,
    ) -> Result<RequirementRecord, IntelligenceServiceError> {
        let description = signal.description.clone().unwrap_or_else(|| {
            match &signal.subcategory {
                Some(sub) => format!("Sourcing requirement for {} / {}", signal.category, sub),
                None => format!("Sourcing requirement for {}", signal.category),
            }
        });

        let requirement = RequirementRecord {
            id: next_requirement_id(),
            source_signal_id: signal.id.clone(),
            category: signal.category.clone(),
            subcategory: signal.subcategory.clone(),
            description,
            estimated_value: signal.estimated_value,
            delivery_location: signal.delivery_location.clone(),
            delivery_timeline_days: signal.delivery_timeline_days,
            created_at: Utc::now(),
        };

        match self.repository.link_requirement(&signal.id, requirement) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => {
                let current = self
                    .repository
                    .fetch(&signal.id)?
                    .ok_or(RepositoryError::NotFound)?;
                let requirement_id = current
                    .converted_to_rfq_id
                    .ok_or(RepositoryError::Conflict)?;
                self.repository
                    .fetch_requirement(&requirement_id)?
                    .ok_or(RepositoryError::NotFound)
                    .map_err(Into::into)
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Error raised by the demand-intelligence service.
#[derive(Debug, thiserror::Error)]
pub enum IntelligenceServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("category '{0}' is not enabled for demand intelligence")]
    CategoryNotEnabled(String),
    #[error("country '{0}' is not enabled for demand intelligence")]
    CountryNotEnabled(String),
    #[error("cannot move signal from {} to {}", from.label(), requested.label())]
    InvalidTransition {
        from: DecisionAction,
        requested: DecisionAction,
    },
}
