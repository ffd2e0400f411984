//! Session and progress bookkeeping with an in-memory fallback.
//!
//! Every write lands in the in-process [`MemorySessionStore`]; when a durable
//! store is attached the write is mirrored there too. A durable store failure
//! marks the run degraded and is logged, never propagated, so callers can
//! always read a terminal session back.
//!
//! A terminal session that reached the durable store is evicted from memory
//! along with its progress log; later reads fall through to the store. Runs
//! that ever degraded stay in memory for the life of the process.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use censo_model::{ProgressEvent, RunSession};

use crate::error::StoreError;
use crate::store::{MemorySessionStore, SessionStore};

pub struct SessionLedger {
    primary: Option<Arc<dyn SessionStore>>,
    memory: MemorySessionStore,
    degraded: Mutex<BTreeSet<String>>,
}

impl SessionLedger {
    /// Memory only.
    pub fn in_memory() -> Self {
        Self {
            primary: None,
            memory: MemorySessionStore::new(),
            degraded: Mutex::new(BTreeSet::new()),
        }
    }

    /// Durable `primary` with the in-memory fallback.
    pub fn with_primary(primary: Arc<dyn SessionStore>) -> Self {
        Self {
            primary: Some(primary),
            ..Self::in_memory()
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Runs whose durable writes failed at least once.
    pub fn is_degraded(&self, run_id: &str) -> bool {
        self.degraded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(run_id)
    }

    fn mark_degraded(&self, run_id: &str, err: &StoreError) {
        let newly = self
            .degraded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id.to_string());
        if newly {
            tracing::warn!(
                run_id,
                error = %err,
                "session store unavailable; keeping run state in memory"
            );
        }
    }

    pub fn save_session(&self, session: &RunSession) {
        // Memory writes are infallible.
        let _ = self.memory.save_session(session);
        let Some(primary) = &self.primary else {
            return;
        };
        match primary.save_session(session) {
            Err(err) => self.mark_degraded(&session.id, &err),
            Ok(()) if session.is_terminal() && !self.is_degraded(&session.id) => {
                self.memory.remove(&session.id);
                tracing::debug!(run_id = %session.id, "terminal session evicted from memory");
            }
            Ok(()) => {}
        }
    }

    pub fn append_event(&self, event: &ProgressEvent) {
        let Some(primary) = &self.primary else {
            let _ = self.memory.append_event(event);
            return;
        };
        let written = primary.append_event(event);
        // Lines arriving after eviction belong to the durable log only.
        if written.is_err() || self.memory.contains(&event.session_id) {
            let _ = self.memory.append_event(event);
        }
        if let Err(err) = written {
            tracing::warn!(
                run_id = %event.session_id,
                error = %err,
                message = %event.message,
                "dropped progress line from session store"
            );
            self.mark_degraded(&event.session_id, &err);
        }
    }

    /// True when the run id is known here or in the durable store.
    pub fn exists(&self, run_id: &str) -> Result<bool, StoreError> {
        Ok(self.load_session(run_id)?.is_some())
    }

    /// Sessions of this process come from memory; older runs from the durable store.
    pub fn load_session(&self, run_id: &str) -> Result<Option<RunSession>, StoreError> {
        if let Some(session) = self.memory.load_session(run_id)? {
            return Ok(Some(session));
        }
        match &self.primary {
            Some(primary) => primary.load_session(run_id),
            None => Ok(None),
        }
    }

    pub fn events(&self, run_id: &str) -> Result<Vec<ProgressEvent>, StoreError> {
        if self.memory.contains(run_id) {
            return self.memory.events(run_id);
        }
        match &self.primary {
            Some(primary) => primary.events(run_id),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_model::ProgressLevel;

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn save_session(&self, _session: &RunSession) -> crate::store::Result<()> {
            Err(StoreError::Unavailable("database offline".into()))
        }

        fn load_session(&self, _run_id: &str) -> crate::store::Result<Option<RunSession>> {
            Err(StoreError::Unavailable("database offline".into()))
        }

        fn append_event(&self, _event: &ProgressEvent) -> crate::store::Result<()> {
            Err(StoreError::Unavailable("database offline".into()))
        }

        fn events(&self, _run_id: &str) -> crate::store::Result<Vec<ProgressEvent>> {
            Err(StoreError::Unavailable("database offline".into()))
        }
    }

    #[test]
    fn broken_primary_degrades_to_memory() {
        let ledger = SessionLedger::with_primary(Arc::new(BrokenStore));
        let session = RunSession::new("run-1", "owner");
        ledger.save_session(&session);
        ledger.append_event(&ProgressEvent::new("run-1", ProgressLevel::Info, "hola"));

        assert!(ledger.is_degraded("run-1"));
        assert_eq!(ledger.load_session("run-1").unwrap().unwrap().id, "run-1");
        assert_eq!(ledger.events("run-1").unwrap().len(), 1);
    }

    #[test]
    fn degraded_terminal_runs_stay_in_memory() {
        let ledger = SessionLedger::with_primary(Arc::new(BrokenStore));
        let mut session = RunSession::new("run-1", "owner");
        ledger.save_session(&session);
        session.fail("sin datos").unwrap();
        ledger.save_session(&session);

        assert!(ledger.memory.contains("run-1"));
        assert!(ledger.load_session("run-1").unwrap().unwrap().is_terminal());
    }

    #[test]
    fn durable_terminal_runs_are_served_from_primary() {
        let primary = Arc::new(MemorySessionStore::new());
        let ledger = SessionLedger::with_primary(primary.clone());
        let mut session = RunSession::new("run-1", "owner");
        ledger.save_session(&session);
        ledger.append_event(&ProgressEvent::new("run-1", ProgressLevel::Info, "uno"));
        assert!(ledger.memory.contains("run-1"));

        session.begin_processing().unwrap();
        ledger.save_session(&session);
        assert!(ledger.memory.contains("run-1"));

        session.fail("sin datos").unwrap();
        ledger.save_session(&session);
        assert!(!ledger.memory.contains("run-1"));
        assert!(ledger.memory.events("run-1").unwrap().is_empty());

        let loaded = ledger.load_session("run-1").unwrap().unwrap();
        assert!(loaded.is_terminal());
        assert_eq!(ledger.events("run-1").unwrap().len(), 1);

        ledger.append_event(&ProgressEvent::new("run-1", ProgressLevel::Info, "tarde"));
        assert!(ledger.memory.events("run-1").unwrap().is_empty());
        assert_eq!(primary.events("run-1").unwrap().len(), 2);
    }

    #[test]
    fn unknown_runs_fall_through_to_primary() {
        let ledger = SessionLedger::with_primary(Arc::new(BrokenStore));
        assert!(ledger.load_session("elsewhere").is_err());
        let memory_only = SessionLedger::in_memory();
        assert!(!memory_only.exists("elsewhere").unwrap());
    }
}
