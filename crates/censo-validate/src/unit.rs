//! Validator unit contract and execution context.
//!
//! # Architecture
//!
//! Every check implements [`ValidatorUnit`] on a unit struct and is listed in
//! [`crate::registry::default_registry`]. Units read the shared
//! [`MappedDataset`] and return findings; they never mutate the dataset and
//! never fail for data-quality problems.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use censo_model::{Finding, MappedDataset, ProgressLevel};

use crate::error::UnitError;
use crate::policy::ValidationPolicy;

/// A specialized, independently executable census check.
///
/// # Example
///
/// ```
/// use censo_model::{Finding, MappedDataset};
/// use censo_validate::{UnitContext, UnitError, ValidatorUnit};
///
/// struct HeadcountCheck;
///
/// impl ValidatorUnit for HeadcountCheck {
///     fn name(&self) -> &'static str {
///         "headcount_check"
///     }
///
///     fn description(&self) -> &'static str {
///         "Reports the number of active records"
///     }
///
///     fn validate(
///         &self,
///         dataset: &MappedDataset,
///         _ctx: &UnitContext,
///     ) -> Result<Vec<Finding>, UnitError> {
///         Ok(vec![Finding::success(
///             self.name(),
///             "dataset",
///             format!("{} registros activos", dataset.active_count()),
///         )])
///     }
/// }
/// ```
pub trait ValidatorUnit: Send + Sync {
    /// Stable identifier used in findings, outcomes and configuration.
    fn name(&self) -> &'static str;

    /// Human-readable description of what the unit checks.
    fn description(&self) -> &'static str;

    /// Lower sorts first. Advisory only; it never gates execution.
    fn priority(&self) -> u32 {
        100
    }

    /// Units whose findings this one complements. Documentation only.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Declared timeout; `None` uses the orchestrator default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Checks the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error only when the dataset itself is structurally broken.
    fn validate(
        &self,
        dataset: &MappedDataset,
        ctx: &UnitContext,
    ) -> Result<Vec<Finding>, UnitError>;
}

/// Receives progress lines emitted by units while they run.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, level: ProgressLevel, message: &str);
}

/// Read-only inputs shared by all units of a run.
#[derive(Clone)]
pub struct UnitContext {
    policy: ValidationPolicy,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl UnitContext {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self {
            policy,
            reporter: None,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn valuation_date(&self) -> NaiveDate {
        self.policy.valuation_date
    }

    /// Forwards a progress line to the run's sink, if one is attached.
    pub fn progress(&self, level: ProgressLevel, message: &str) {
        if let Some(reporter) = &self.reporter {
            reporter.report(level, message);
        }
    }
}

impl Default for UnitContext {
    fn default() -> Self {
        Self::new(ValidationPolicy::default())
    }
}

impl fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitContext")
            .field("policy", &self.policy)
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}
