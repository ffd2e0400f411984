//! Orchestration core for census validation runs.
//!
//! An [`Orchestrator`] takes a [`censo_model::RawDataset`], maps it once with
//! the column mapper, dispatches every registered validator unit against the
//! shared snapshot and records the resulting [`censo_model::Report`] on the
//! run's [`censo_model::RunSession`].
//!
//! ```no_run
//! use censo_core::{CensoConfig, Orchestrator};
//! use censo_model::{DatasetMetadata, RawDataset, RawSheet};
//! use censo_validate::default_registry;
//!
//! # async fn demo(active: RawSheet, terminated: RawSheet) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(default_registry().clone(), CensoConfig::default());
//! let raw = RawDataset::new(active, terminated, DatasetMetadata::new("censo.xlsx", 0));
//! let handle = orchestrator.start_run(raw, "run-1", "actuario")?;
//! let session = handle.await?;
//! println!("{}", session.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod progress;
pub mod store;

pub use config::{CensoConfig, OrchestratorConfig};
pub use error::{ConfigError, OrchestratorError, StoreError};
pub use orchestrator::{META_VALIDATOR, Orchestrator};
pub use progress::ProgressSink;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
