use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use censo_model::{ProgressEvent, RunSession};

use super::{Result, SessionStore};

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<String, RunSession>,
    events: HashMap<String, Vec<ProgressEvent>>,
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tables: Mutex<Tables>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock still holds consistent rows; writers never panic midway.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.tables().sessions.contains_key(run_id)
    }

    /// Drops a run's session and progress log. Returns whether it was held.
    pub fn remove(&self, run_id: &str) -> bool {
        let mut tables = self.tables();
        tables.events.remove(run_id);
        tables.sessions.remove(run_id).is_some()
    }
}

impl SessionStore for MemorySessionStore {
    fn save_session(&self, session: &RunSession) -> Result<()> {
        self.tables()
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load_session(&self, run_id: &str) -> Result<Option<RunSession>> {
        Ok(self.tables().sessions.get(run_id).cloned())
    }

    fn append_event(&self, event: &ProgressEvent) -> Result<()> {
        self.tables()
            .events
            .entry(event.session_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    fn events(&self, run_id: &str) -> Result<Vec<ProgressEvent>> {
        Ok(self
            .tables()
            .events
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_model::{ProgressLevel, RunStatus};

    #[test]
    fn keeps_latest_session_and_ordered_events() {
        let store = MemorySessionStore::new();
        let mut session = RunSession::new("run-1", "owner");
        store.save_session(&session).unwrap();
        session.begin_processing().unwrap();
        store.save_session(&session).unwrap();

        store
            .append_event(&ProgressEvent::new("run-1", ProgressLevel::Info, "uno"))
            .unwrap();
        store
            .append_event(&ProgressEvent::new("run-1", ProgressLevel::Success, "dos"))
            .unwrap();

        let loaded = store.load_session("run-1").unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Processing);
        let messages: Vec<_> = store
            .events("run-1")
            .unwrap()
            .into_iter()
            .map(|event| event.message)
            .collect();
        assert_eq!(messages, vec!["uno", "dos"]);
        assert!(store.load_session("other").unwrap().is_none());
        assert!(store.events("other").unwrap().is_empty());

        assert!(store.remove("run-1"));
        assert!(!store.contains("run-1"));
        assert!(store.events("run-1").unwrap().is_empty());
        assert!(!store.remove("run-1"));
    }
}
