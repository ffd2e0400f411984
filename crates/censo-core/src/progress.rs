//! Progress sink handed to validator units.

use std::sync::Arc;

use censo_model::{ProgressEvent, ProgressLevel};
use censo_validate::ProgressReporter;

use crate::ledger::SessionLedger;

/// Appends timestamped progress lines for one run. Write failures never
/// reach the writer.
#[derive(Clone)]
pub struct ProgressSink {
    run_id: String,
    ledger: Arc<SessionLedger>,
}

impl ProgressSink {
    pub fn new(run_id: impl Into<String>, ledger: Arc<SessionLedger>) -> Self {
        Self {
            run_id: run_id.into(),
            ledger,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn emit(&self, level: ProgressLevel, message: impl Into<String>) {
        let event = ProgressEvent::new(self.run_id.clone(), level, message);
        self.ledger.append_event(&event);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ProgressLevel::Error, message);
    }
}

impl ProgressReporter for ProgressSink {
    fn report(&self, level: ProgressLevel, message: &str) {
        self.emit(level, message);
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}
