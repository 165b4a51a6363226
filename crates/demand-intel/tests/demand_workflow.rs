//! Integration specifications for the demand-intelligence workflow.
//!
//! Scenarios exercise the public service facade and HTTP router end to end:
//! ingestion, classification, decision routing, manual overrides, idempotent
//! RFQ materialization, settings, and metrics.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use demand_intel::intelligence::{
        BuyerType, DecisionAction, DecisionSettings, DemandIntelligenceService, DemandSignal,
        DirectoryError, RepositoryError, RequirementId, RequirementRecord, SettingsStore,
        SignalId, SignalQuery, SignalRepository, SignalSource, SignalSubmission,
        SupplierAvailability, SupplierDirectory,
    };

    pub(super) fn submission() -> SignalSubmission {
        SignalSubmission {
            source: SignalSource::MarketScan,
            category: "industrial-fasteners".to_string(),
            subcategory: Some("anchor-bolts".to_string()),
            industry: Some("construction".to_string()),
            description: Some("Bulk anchor bolts for bridge retrofit".to_string()),
            estimated_value: 300_000.0,
            delivery_location: "DE".to_string(),
            delivery_timeline_days: 10,
            buyer_type: BuyerType::VerifiedBusiness,
            matching_suppliers_count: Some(4),
            best_supplier_match_score: Some(9.0),
            avg_supplier_match_score: Some(9.0),
        }
    }

    pub(super) fn settings() -> DecisionSettings {
        DecisionSettings {
            auto_rfq_min_score: 8.0,
            admin_review_min_score: 5.0,
            require_supplier_availability: true,
            min_matching_suppliers: 1,
            ..DecisionSettings::default()
        }
    }

    #[derive(Default)]
    struct Tables {
        signals: HashMap<SignalId, DemandSignal>,
        requirements: HashMap<RequirementId, RequirementRecord>,
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryRepository {
        tables: Arc<Mutex<Tables>>,
    }

    impl MemoryRepository {
        pub(super) fn requirement_count(&self) -> usize {
            self.tables.lock().expect("lock").requirements.len()
        }
    }

    impl SignalRepository for MemoryRepository {
        fn insert(&self, signal: DemandSignal) -> Result<DemandSignal, RepositoryError> {
            let mut tables = self.tables.lock().expect("lock");
            if tables.signals.contains_key(&signal.id) {
                return Err(RepositoryError::Conflict);
            }
            tables.signals.insert(signal.id.clone(), signal.clone());
            Ok(signal)
        }

        fn fetch(&self, id: &SignalId) -> Result<Option<DemandSignal>, RepositoryError> {
            Ok(self.tables.lock().expect("lock").signals.get(id).cloned())
        }

        fn list(&self, query: &SignalQuery) -> Result<Vec<DemandSignal>, RepositoryError> {
            Ok(self
                .tables
                .lock()
                .expect("lock")
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
            let mut tables = self.tables.lock().expect("lock");
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
            let mut tables = self.tables.lock().expect("lock");
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
            let signal = tables.signals.get_mut(id).expect("present");
            signal.converted_to_rfq_id = Some(requirement_id);
            signal.decision_action = DecisionAction::AutoRfq;
            Ok(requirement)
        }

        fn fetch_requirement(
            &self,
            id: &RequirementId,
        ) -> Result<Option<RequirementRecord>, RepositoryError> {
            Ok(self
                .tables
                .lock()
                .expect("lock")
                .requirements
                .get(id)
                .cloned())
        }
    }

    /// Repository whose requirement writes fail, for the materialization
    /// outage scenario.
    #[derive(Default, Clone)]
    pub(super) struct LinkOutageRepository {
        pub(super) inner: MemoryRepository,
    }

    impl SignalRepository for LinkOutageRepository {
        fn insert(&self, signal: DemandSignal) -> Result<DemandSignal, RepositoryError> {
            self.inner.insert(signal)
        }

        fn fetch(&self, id: &SignalId) -> Result<Option<DemandSignal>, RepositoryError> {
            self.inner.fetch(id)
        }

        fn list(&self, query: &SignalQuery) -> Result<Vec<DemandSignal>, RepositoryError> {
            self.inner.list(query)
        }

        fn set_action(
            &self,
            id: &SignalId,
            from: DecisionAction,
            to: DecisionAction,
        ) -> Result<(), RepositoryError> {
            self.inner.set_action(id, from, to)
        }

        fn link_requirement(
            &self,
            _id: &SignalId,
            _requirement: RequirementRecord,
        ) -> Result<RequirementRecord, RepositoryError> {
            Err(RepositoryError::Unavailable(
                "requirement table offline".to_string(),
            ))
        }

        fn fetch_requirement(
            &self,
            id: &RequirementId,
        ) -> Result<Option<RequirementRecord>, RepositoryError> {
            self.inner.fetch_requirement(id)
        }
    }

    #[derive(Clone)]
    pub(super) struct MemorySettings {
        settings: Arc<Mutex<DecisionSettings>>,
    }

    impl MemorySettings {
        pub(super) fn with(settings: DecisionSettings) -> Self {
            Self {
                settings: Arc::new(Mutex::new(settings)),
            }
        }
    }

    impl SettingsStore for MemorySettings {
        fn load(&self) -> Result<DecisionSettings, RepositoryError> {
            Ok(self.settings.lock().expect("lock").clone())
        }

        fn save(&self, settings: DecisionSettings) -> Result<(), RepositoryError> {
            *self.settings.lock().expect("lock") = settings;
            Ok(())
        }
    }

    /// Settings store that is always down, for the fail-closed scenario.
    #[derive(Default, Clone)]
    pub(super) struct BrokenSettings;

    impl SettingsStore for BrokenSettings {
        fn load(&self) -> Result<DecisionSettings, RepositoryError> {
            Err(RepositoryError::Unavailable("settings table offline".to_string()))
        }

        fn save(&self, _settings: DecisionSettings) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("settings table offline".to_string()))
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct MemoryDirectory {
        pub(super) availability: SupplierAvailability,
    }

    impl SupplierDirectory for MemoryDirectory {
        fn availability(
            &self,
            _category: &str,
            _subcategory: Option<&str>,
            _country: &str,
        ) -> Result<SupplierAvailability, DirectoryError> {
            Ok(self.availability)
        }
    }

    pub(super) fn build_service() -> (
        DemandIntelligenceService<MemoryRepository, MemorySettings, MemoryDirectory>,
        Arc<MemoryRepository>,
        Arc<MemorySettings>,
    ) {
        let repository = Arc::new(MemoryRepository::default());
        let store = Arc::new(MemorySettings::with(settings()));
        let directory = Arc::new(MemoryDirectory::default());
        let service =
            DemandIntelligenceService::new(repository.clone(), store.clone(), directory);
        (service, repository, store)
    }
}

mod ingestion {
    use super::common::*;
    use demand_intel::intelligence::{Classification, DecisionAction, SignalRepository};

    #[test]
    fn strong_signal_auto_converts_to_rfq() {
        let (service, repository, _) = build_service();
        let signal = service.ingest(submission()).expect("ingest succeeds");

        assert_eq!(signal.classification, Classification::Buy);
        assert_eq!(signal.decision_action, DecisionAction::AutoRfq);
        let requirement_id = signal.converted_to_rfq_id.expect("linked requirement");
        let requirement = repository
            .fetch_requirement(&requirement_id)
            .expect("repo fetch")
            .expect("requirement present");
        assert_eq!(requirement.source_signal_id, signal.id);
        assert_eq!(requirement.category, signal.category);
    }

    #[test]
    fn unavailable_suppliers_force_admin_review_despite_score() {
        let (service, _, _) = build_service();
        let mut s = submission();
        s.matching_suppliers_count = Some(0);
        s.best_supplier_match_score = None;
        s.avg_supplier_match_score = None;

        let signal = service.ingest(s).expect("ingest succeeds");
        assert_eq!(signal.decision_action, DecisionAction::AdminReview);
        assert!(!signal.fulfilment_feasible);
        assert!(signal.converted_to_rfq_id.is_none());
    }

    #[test]
    fn weak_signal_is_ignored_as_noise() {
        let (service, _, _) = build_service();
        let mut s = submission();
        s.estimated_value = 200.0;
        s.delivery_timeline_days = 180;
        s.buyer_type = demand_intel::intelligence::BuyerType::Guest;
        s.subcategory = None;
        s.industry = None;
        s.matching_suppliers_count = Some(1);
        s.best_supplier_match_score = None;
        s.avg_supplier_match_score = None;

        let signal = service.ingest(s).expect("ingest succeeds");
        assert_eq!(signal.classification, Classification::Noise);
        assert_eq!(signal.decision_action, DecisionAction::Ignore);
    }

    #[test]
    fn settings_outage_fails_ingestion_instead_of_guessing() {
        use demand_intel::intelligence::{
            DemandIntelligenceService, IntelligenceServiceError, RepositoryError,
        };
        use std::sync::Arc;

        let repository = Arc::new(MemoryRepository::default());
        let directory = Arc::new(MemoryDirectory::default());
        let service = DemandIntelligenceService::new(
            repository.clone(),
            Arc::new(BrokenSettings),
            directory,
        );

        let error = service.ingest(submission()).expect_err("ingest fails");
        assert!(matches!(
            error,
            IntelligenceServiceError::Repository(RepositoryError::Unavailable(_))
        ));
        assert!(repository
            .list(&Default::default())
            .expect("list")
            .is_empty());
    }

    #[test]
    fn out_of_scope_country_is_rejected() {
        use demand_intel::intelligence::IntelligenceServiceError;

        let (service, _, store) = build_service();
        let mut restricted = settings();
        restricted.enabled_countries = vec!["IN".to_string()];
        service
            .update_settings(restricted)
            .expect("settings update succeeds");
        let _ = store;

        let error = service.ingest(submission()).expect_err("ingest rejected");
        assert!(matches!(
            error,
            IntelligenceServiceError::CountryNotEnabled(ref country) if country == "DE"
        ));
    }

    #[test]
    fn failed_materialization_leaves_signal_in_review_queue() {
        use demand_intel::intelligence::{
            DemandIntelligenceService, IntelligenceServiceError, RepositoryError,
        };
        use std::sync::Arc;

        let repository = Arc::new(LinkOutageRepository::default());
        let service = DemandIntelligenceService::new(
            repository.clone(),
            Arc::new(MemorySettings::with(settings())),
            Arc::new(MemoryDirectory::default()),
        );

        let error = service.ingest(submission()).expect_err("ingest fails");
        assert!(matches!(
            error,
            IntelligenceServiceError::Repository(RepositoryError::Unavailable(_))
        ));

        let stored = repository.list(&Default::default()).expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].decision_action, DecisionAction::AdminReview);
        assert!(stored[0].converted_to_rfq_id.is_none());
        assert_eq!(repository.inner.requirement_count(), 0);
    }

    #[test]
    fn best_match_score_does_not_stand_in_for_the_average() {
        let (service, _, _) = build_service();
        let mut s = submission();
        s.best_supplier_match_score = Some(9.5);
        s.avg_supplier_match_score = None;

        let signal = service.ingest(s).expect("ingest succeeds");
        assert_eq!(signal.best_supplier_match_score, Some(9.5));
        assert!((signal.scores.feasibility - 4.8).abs() < 1e-4);
    }
}

mod decisions {
    use super::common::*;
    use demand_intel::intelligence::{DecisionAction, IntelligenceServiceError};

    fn admin_review_signal(
        service: &demand_intel::intelligence::DemandIntelligenceService<
            MemoryRepository,
            MemorySettings,
            MemoryDirectory,
        >,
    ) -> demand_intel::intelligence::DemandSignal {
        let mut s = submission();
        s.estimated_value = 20_000.0;
        s.delivery_timeline_days = 45;
        s.buyer_type = demand_intel::intelligence::BuyerType::RegisteredBusiness;
        let signal = service.ingest(s).expect("ingest succeeds");
        assert_eq!(signal.decision_action, DecisionAction::AdminReview);
        signal
    }

    #[test]
    fn admin_review_signal_can_be_approved() {
        let (service, repository, _) = build_service();
        let signal = admin_review_signal(&service);

        let (approved, requirement) = service.approve(&signal.id).expect("approval succeeds");
        assert_eq!(approved.decision_action, DecisionAction::AutoRfq);
        assert_eq!(approved.converted_to_rfq_id, Some(requirement.id.clone()));
        assert_eq!(repository.requirement_count(), 1);
    }

    #[test]
    fn approval_is_idempotent() {
        let (service, repository, _) = build_service();
        let signal = admin_review_signal(&service);

        let (_, first) = service.approve(&signal.id).expect("first approval");
        let (_, second) = service.approve(&signal.id).expect("second approval");

        assert_eq!(first.id, second.id);
        assert_eq!(repository.requirement_count(), 1);
    }

    #[test]
    fn admin_review_signal_can_be_dismissed() {
        let (service, _, _) = build_service();
        let signal = admin_review_signal(&service);

        let dismissed = service.dismiss(&signal.id).expect("dismissal succeeds");
        assert_eq!(dismissed.decision_action, DecisionAction::Ignore);
    }

    #[test]
    fn dismissed_signal_cannot_be_approved() {
        let (service, _, _) = build_service();
        let signal = admin_review_signal(&service);
        service.dismiss(&signal.id).expect("dismissal succeeds");

        let error = service.approve(&signal.id).expect_err("approval rejected");
        assert!(matches!(
            error,
            IntelligenceServiceError::InvalidTransition {
                from: DecisionAction::Ignore,
                ..
            }
        ));
    }

    #[test]
    fn ignored_signal_cannot_be_dismissed_again() {
        let (service, _, _) = build_service();
        let signal = admin_review_signal(&service);
        service.dismiss(&signal.id).expect("dismissal succeeds");

        let error = service.dismiss(&signal.id).expect_err("second dismissal rejected");
        assert!(matches!(
            error,
            IntelligenceServiceError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn dismissed_signal_rejects_a_late_requirement_link() {
        use chrono::Utc;
        use demand_intel::intelligence::{
            RepositoryError, RequirementId, RequirementRecord, SignalRepository,
        };

        let (service, repository, _) = build_service();
        let signal = admin_review_signal(&service);
        service.dismiss(&signal.id).expect("dismissal succeeds");

        // An approval that fetched the signal before the dismissal landed
        // must lose at the store, not resurrect the signal.
        let stale = RequirementRecord {
            id: RequirementId("rfq-stale".to_string()),
            source_signal_id: signal.id.clone(),
            category: signal.category.clone(),
            subcategory: signal.subcategory.clone(),
            description: "Stale approval racing a dismissal".to_string(),
            estimated_value: signal.estimated_value,
            delivery_location: signal.delivery_location.clone(),
            delivery_timeline_days: signal.delivery_timeline_days,
            created_at: Utc::now(),
        };
        let error = repository
            .link_requirement(&signal.id, stale)
            .expect_err("link rejected");
        assert!(matches!(error, RepositoryError::Conflict));
        assert_eq!(repository.requirement_count(), 0);

        let current = repository
            .fetch(&signal.id)
            .expect("fetch")
            .expect("signal present");
        assert_eq!(current.decision_action, DecisionAction::Ignore);
        assert!(current.converted_to_rfq_id.is_none());
    }
}

mod listings {
    use super::common::*;
    use demand_intel::intelligence::{Classification, SignalQuery};

    #[test]
    fn listing_ranks_by_overall_score_descending() {
        let (service, _, _) = build_service();

        let mut weak = submission();
        weak.estimated_value = 5_000.0;
        weak.delivery_timeline_days = 90;
        weak.buyer_type = demand_intel::intelligence::BuyerType::Guest;
        service.ingest(weak).expect("weak ingest");
        service.ingest(submission()).expect("strong ingest");

        let listed = service.list(&SignalQuery::default()).expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed[0].scores.overall >= listed[1].scores.overall);
    }

    #[test]
    fn listing_filters_by_classification_and_limit() {
        let (service, _, _) = build_service();
        service.ingest(submission()).expect("ingest");

        let query = SignalQuery {
            classification: Some(Classification::Buy),
            limit: Some(1),
            ..SignalQuery::default()
        };
        let listed = service.list(&query).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].classification, Classification::Buy);

        let none = service
            .list(&SignalQuery {
                classification: Some(Classification::Noise),
                ..SignalQuery::default()
            })
            .expect("list");
        assert!(none.is_empty());
    }

    #[test]
    fn metrics_reflect_ingested_signals() {
        let (service, _, _) = build_service();
        service.ingest(submission()).expect("ingest");

        let metrics = service.metrics().expect("metrics");
        assert_eq!(metrics.total_signals, 1);
        assert_eq!(metrics.buy_signals, 1);
        assert_eq!(metrics.converted_to_rfq, 1);
        assert!((metrics.auto_rfq_rate - 1.0).abs() < f64::EPSILON);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use demand_intel::intelligence::{intelligence_router, DemandIntelligenceService};

    fn build_router() -> axum::Router {
        let repository = Arc::new(MemoryRepository::default());
        let store = Arc::new(MemorySettings::with(settings()));
        let directory = Arc::new(MemoryDirectory::default());
        let service = Arc::new(DemandIntelligenceService::new(repository, store, directory));
        intelligence_router(service)
    }

    #[tokio::test]
    async fn post_signal_returns_routed_view() {
        let router = build_router();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/demand/signals")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&submission()).expect("serialize submission"),
            ))
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(
            payload.get("classification").and_then(Value::as_str),
            Some("buy")
        );
        assert_eq!(
            payload.get("decision_action").and_then(Value::as_str),
            Some("auto_rfq")
        );
        assert!(payload.get("converted_to_rfq_id").is_some());
    }

    #[tokio::test]
    async fn list_endpoint_applies_query_filters() {
        let router = build_router();

        let ingest = Request::builder()
            .method("POST")
            .uri("/api/v1/demand/signals")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&submission()).expect("serialize"),
            ))
            .expect("request");
        router
            .clone()
            .oneshot(ingest)
            .await
            .expect("ingest dispatch");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/demand/signals?classification=buy&min_overall=8.0")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("list dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        let listed = payload.as_array().expect("array body");
        assert_eq!(listed.len(), 1);

        let empty = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/demand/signals?classification=noise")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("list dispatch");
        let body = to_bytes(empty.into_body(), 1024 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert!(payload.as_array().expect("array body").is_empty());
    }

    #[tokio::test]
    async fn approve_unknown_signal_returns_not_found() {
        let router = build_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/demand/signals/sig-missing/approve")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn settings_round_trip_and_validation() {
        let router = build_router();

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/demand/settings")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let mut current: Value = serde_json::from_slice(&body).expect("json");

        current["auto_rfq_min_score"] = Value::from(9.0);
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/demand/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(current.to_string()))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        current["auto_rfq_min_score"] = Value::from(2.0);
        current["admin_review_min_score"] = Value::from(6.0);
        let response = router
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/demand/settings")
                    .header("content-type", "application/json")
                    .body(Body::from(current.to_string()))
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_aggregate() {
        let router = build_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/demand/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.get("total_signals").and_then(Value::as_u64), Some(0));
    }
}
