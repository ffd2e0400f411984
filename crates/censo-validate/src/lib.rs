//! Validator units for employee census data.
//!
//! A [`ValidatorUnit`] inspects a [`censo_model::MappedDataset`] and returns
//! [`censo_model::Finding`]s. The [`default_registry`] holds the standard
//! census checks in the order they are dispatched and reported.

pub mod checks;
pub mod error;
pub mod identity;
pub mod policy;
pub mod registry;
pub mod unit;
pub mod util;

pub use error::UnitError;
pub use policy::{DuplicateRule, ValidationPolicy};
pub use registry::{ValidatorRegistry, default_registry};
pub use unit::{ProgressReporter, UnitContext, ValidatorUnit};
