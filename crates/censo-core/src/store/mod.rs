//! Session persistence.
//!
//! The orchestrator only needs to save a session snapshot and append a
//! progress line. [`FileSessionStore`] is the durable implementation and
//! [`MemorySessionStore`] the in-process one used alone or as the fallback.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use censo_model::{ProgressEvent, RunSession};

use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Narrow persistence interface for run sessions and their progress log.
///
/// Implementations may block on I/O. The orchestrator writes session
/// snapshots from the blocking pool; the initial `PENDING` row and progress
/// lines are written inline by the caller and should stay cheap.
pub trait SessionStore: Send + Sync {
    /// Inserts or replaces the session row.
    fn save_session(&self, session: &RunSession) -> Result<()>;

    fn load_session(&self, run_id: &str) -> Result<Option<RunSession>>;

    fn append_event(&self, event: &ProgressEvent) -> Result<()>;

    /// Events of one run in append order.
    fn events(&self, run_id: &str) -> Result<Vec<ProgressEvent>>;
}
