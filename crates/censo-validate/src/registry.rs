//! Ordered registry of validator units.
//!
//! Registration order is the dispatch order and the order findings appear
//! in the report, so the registry is an explicit list rather than a map.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::checks;
use crate::unit::ValidatorUnit;

/// Validator units in registration order.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    units: Vec<Arc<dyn ValidatorUnit>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit. A unit with the same name is replaced in place.
    pub fn register(&mut self, unit: Arc<dyn ValidatorUnit>) {
        if let Some(slot) = self.units.iter_mut().find(|u| u.name() == unit.name()) {
            debug!(unit = unit.name(), "replacing registered validator unit");
            *slot = unit;
        } else {
            self.units.push(unit);
        }
    }

    #[must_use]
    pub fn with(mut self, unit: impl ValidatorUnit + 'static) -> Self {
        self.register(Arc::new(unit));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ValidatorUnit>> {
        self.units.iter().find(|unit| unit.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ValidatorUnit>> {
        self.units.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.units.iter().map(|unit| unit.name())
    }

    /// Units sorted by declared priority, for display. Ties keep registry order.
    pub fn by_priority(&self) -> Vec<&Arc<dyn ValidatorUnit>> {
        let mut units: Vec<_> = self.units.iter().collect();
        units.sort_by_key(|unit| unit.priority());
        units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Cached default registry with all standard units.
static DEFAULT_REGISTRY: OnceLock<ValidatorRegistry> = OnceLock::new();

/// Returns the registry of the 19 standard census checks.
///
/// # Registered Units
///
/// | # | Unit | Area |
/// |---|------|------|
/// | 1 | `completeness_auditor` | Required columns and fill ratios |
/// | 2 | `rfc_validator` | RFC format and embedded date |
/// | 3 | `curp_validator` | CURP format, state, check digit |
/// | 4 | `nss_validator` | NSS length and check digit |
/// | 5 | `identity_consistency` | RFC, CURP and birth date agreement |
/// | 6 | `birth_date_validator` | Birth date presence and plausibility |
/// | 7 | `age_validator` | Age at valuation date |
/// | 8 | `hire_date_validator` | Hire date and age at hire |
/// | 9 | `gender_validator` | Gender codes and CURP agreement |
/// | 10 | `salary_validator` | Daily salary and minimum wage |
/// | 11 | `integrated_salary_validator` | SDI and integration factor |
/// | 12 | `salary_ceiling_validator` | Contribution ceiling |
/// | 13 | `salary_outlier_analyzer` | IQR salary outliers |
/// | 14 | `position_classifier` | Position classes |
/// | 15 | `hierarchy_validator` | Employee type and hierarchy |
/// | 16 | `duplicate_detector` | Duplicated identifiers |
/// | 17 | `termination_analyzer` | Termination dates |
/// | 18 | `settlement_validator` | Termination causes and legal minimums |
/// | 19 | `general_analyst` | Cross-sheet sanity |
pub fn default_registry() -> &'static ValidatorRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> ValidatorRegistry {
    ValidatorRegistry::new()
        .with(checks::completeness::CompletenessAuditor)
        .with(checks::rfc::RfcValidator)
        .with(checks::curp::CurpValidator)
        .with(checks::nss::NssValidator)
        .with(checks::identity::IdentityConsistency)
        .with(checks::birth_date::BirthDateValidator)
        .with(checks::age::AgeValidator)
        .with(checks::hire_date::HireDateValidator)
        .with(checks::gender::GenderValidator)
        .with(checks::salary::SalaryValidator)
        .with(checks::integrated_salary::IntegratedSalaryValidator)
        .with(checks::salary_ceiling::SalaryCeilingValidator)
        .with(checks::outliers::SalaryOutlierAnalyzer)
        .with(checks::position::PositionClassifier)
        .with(checks::hierarchy::HierarchyValidator)
        .with(checks::duplicates::DuplicateDetector)
        .with(checks::termination::TerminationAnalyzer)
        .with(checks::settlement::SettlementValidator)
        .with(checks::general::GeneralAnalyst)
}
