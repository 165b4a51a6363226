use serde::{Deserialize, Serialize};

/// Decision thresholds and routing gates, edited only through the admin
/// settings endpoint and read fresh on every classification.
///
/// This struct is the single authoritative home for the score cut points;
/// nothing else in the crate hard-codes a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSettings {
    pub auto_rfq_min_score: f32,
    pub admin_review_min_score: f32,
    pub buy_classification_min_score: f32,
    pub research_classification_min_score: f32,
    pub require_supplier_availability: bool,
    pub min_matching_suppliers: u32,
    /// Empty means every category is in scope.
    #[serde(default)]
    pub enabled_categories: Vec<String>,
    /// Empty means every country is in scope.
    #[serde(default)]
    pub enabled_countries: Vec<String>,
    pub scan_interval_hours: u32,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            auto_rfq_min_score: 8.0,
            admin_review_min_score: 5.0,
            buy_classification_min_score: 7.0,
            research_classification_min_score: 5.0,
            require_supplier_availability: true,
            min_matching_suppliers: 1,
            enabled_categories: Vec::new(),
            enabled_countries: Vec::new(),
            scan_interval_hours: 24,
        }
    }
}

impl DecisionSettings {
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        for (name, value) in [
            ("auto_rfq_min_score", self.auto_rfq_min_score),
            ("admin_review_min_score", self.admin_review_min_score),
            (
                "buy_classification_min_score",
                self.buy_classification_min_score,
            ),
            (
                "research_classification_min_score",
                self.research_classification_min_score,
            ),
        ] {
            if !value.is_finite() || !(0.0..=10.0).contains(&value) {
                return Err(SettingsValidationError::ThresholdOutOfRange { name, value });
            }
        }

        if self.auto_rfq_min_score < self.admin_review_min_score {
            return Err(SettingsValidationError::InvertedRoutingThresholds {
                auto_rfq: self.auto_rfq_min_score,
                admin_review: self.admin_review_min_score,
            });
        }

        if self.buy_classification_min_score < self.research_classification_min_score {
            return Err(SettingsValidationError::InvertedClassificationThresholds {
                buy: self.buy_classification_min_score,
                research: self.research_classification_min_score,
            });
        }

        if self.scan_interval_hours == 0 {
            return Err(SettingsValidationError::ZeroScanInterval);
        }

        Ok(())
    }

    pub fn category_enabled(&self, category: &str) -> bool {
        self.enabled_categories.is_empty()
            || self
                .enabled_categories
                .iter()
                .any(|enabled| enabled.eq_ignore_ascii_case(category))
    }

    pub fn country_enabled(&self, country: &str) -> bool {
        self.enabled_countries.is_empty()
            || self
                .enabled_countries
                .iter()
                .any(|enabled| enabled.eq_ignore_ascii_case(country))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsValidationError {
    #[error("{name} must be a finite score within 0-10, found {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    #[error("auto_rfq_min_score {auto_rfq} must not be below admin_review_min_score {admin_review}")]
    InvertedRoutingThresholds { auto_rfq: f32, admin_review: f32 },
    #[error("buy_classification_min_score {buy} must not be below research_classification_min_score {research}")]
    InvertedClassificationThresholds { buy: f32, research: f32 },
    #[error("scan_interval_hours must be at least 1")]
    ZeroScanInterval,
}
