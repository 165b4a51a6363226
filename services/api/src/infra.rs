use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use demand_intel::access::{AccessPolicy, AdminRole, ViewGate};
use demand_intel::config::AccessConfig;
use demand_intel::intelligence::{
    DecisionAction, DecisionSettings, DemandSignal, DirectoryError, RepositoryError,
    RequirementId, RequirementRecord, SettingsStore, SignalId, SignalQuery, SignalRepository,
    SupplierAvailability, SupplierDirectory,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) view_gate: Arc<ViewGate>,
}

/// Build the management-view gate with role secrets taken from the
/// environment (with demo defaults for local runs).
pub(crate) fn view_gate(config: &AccessConfig) -> ViewGate {
    let mut gate = ViewGate::new(AccessPolicy::new(config.view_session_ttl_minutes));
    let pin = env::var("APP_VIEW_PIN").unwrap_or_else(|_| "2468".to_string());
    let password =
        env::var("APP_VIEW_PASSWORD").unwrap_or_else(|_| "change-me-before-prod".to_string());
    gate.register(AdminRole::Analyst, pin.clone());
    gate.register(AdminRole::Operations, pin);
    gate.register(AdminRole::SuperAdmin, password);
    gate
}

#[derive(Default)]
struct SignalTables {
    signals: HashMap<SignalId, DemandSignal>,
    requirements: HashMap<RequirementId, RequirementRecord>,
}

/// In-memory stand-in for the relational store. One mutex spans the signal
/// and requirement tables so conditional writes observe a consistent view.
#[derive(Default, Clone)]
pub(crate) struct InMemorySignalRepository {
    tables: Arc<Mutex<SignalTables>>,
}

impl SignalRepository for InMemorySignalRepository {
    fn insert(&self, signal: DemandSignal) -> Result<DemandSignal, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        if tables.signals.contains_key(&signal.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.signals.insert(signal.id.clone(), signal.clone());
        Ok(signal)
    }

    fn fetch(&self, id: &SignalId) -> Result<Option<DemandSignal>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.signals.get(id).cloned())
    }

    fn list(&self, query: &SignalQuery) -> Result<Vec<DemandSignal>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables
            .signals
            .values()
            .filter(|signal| query.matches(signal))
            .cloned()
            .collect())
    }

    fn set_action(
        &self,
        id: &SignalId,
        from: DecisionAction,
        to: DecisionAction,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let signal = tables.signals.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if signal.decision_action != from {
            return Err(RepositoryError::Conflict);
        }
        signal.decision_action = to;
        Ok(())
    }

    fn link_requirement(
        &self,
        id: &SignalId,
        requirement: RequirementRecord,
    ) -> Result<RequirementRecord, RepositoryError> {
        let mut tables = self.tables.lock().expect("repository mutex poisoned");
        let signal = tables.signals.get(id).ok_or(RepositoryError::NotFound)?;
        if signal.converted_to_rfq_id.is_some()
            || !matches!(
                signal.decision_action,
                DecisionAction::AdminReview | DecisionAction::AutoRfq
            )
        {
            return Err(RepositoryError::Conflict);
        }

        let requirement_id = requirement.id.clone();
        tables
            .requirements
            .insert(requirement_id.clone(), requirement.clone());
        let signal = tables
            .signals
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        signal.converted_to_rfq_id = Some(requirement_id);
        signal.decision_action = DecisionAction::AutoRfq;
        Ok(requirement)
    }

    fn fetch_requirement(
        &self,
        id: &RequirementId,
    ) -> Result<Option<RequirementRecord>, RepositoryError> {
        let tables = self.tables.lock().expect("repository mutex poisoned");
        Ok(tables.requirements.get(id).cloned())
    }
}

/// Settings singleton backed by a mutex. Starts from the centralized
/// defaults.
#[derive(Clone)]
pub(crate) struct InMemorySettingsStore {
    settings: Arc<Mutex<DecisionSettings>>,
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self {
            settings: Arc::new(Mutex::new(DecisionSettings::default())),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Result<DecisionSettings, RepositoryError> {
        let guard = self.settings.lock().expect("settings mutex poisoned");
        Ok(guard.clone())
    }

    fn save(&self, settings: DecisionSettings) -> Result<(), RepositoryError> {
        let mut guard = self.settings.lock().expect("settings mutex poisoned");
        *guard = settings;
        Ok(())
    }
}

/// Static supplier-availability table keyed by (category, country), with a
/// fallback row for unknown markets.
#[derive(Clone)]
pub(crate) struct StaticSupplierDirectory {
    rows: Arc<HashMap<(String, String), SupplierAvailability>>,
    fallback: SupplierAvailability,
}

impl StaticSupplierDirectory {
    pub(crate) fn with_rows(
        rows: impl IntoIterator<Item = ((String, String), SupplierAvailability)>,
        fallback: SupplierAvailability,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|((category, country), availability)| {
                (
                    (category.to_ascii_lowercase(), country.to_ascii_lowercase()),
                    availability,
                )
            })
            .collect();
        Self {
            rows: Arc::new(rows),
            fallback,
        }
    }
}

impl Default for StaticSupplierDirectory {
    fn default() -> Self {
        Self::with_rows(
            [],
            SupplierAvailability {
                matching_count: 0,
                best_match_score: None,
                avg_match_score: None,
            },
        )
    }
}

impl SupplierDirectory for StaticSupplierDirectory {
    fn availability(
        &self,
        category: &str,
        _subcategory: Option<&str>,
        country: &str,
    ) -> Result<SupplierAvailability, DirectoryError> {
        let key = (category.to_ascii_lowercase(), country.to_ascii_lowercase());
        Ok(self.rows.get(&key).copied().unwrap_or(self.fallback))
    }
}
