use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use censo_model::{ProgressEvent, RunSession};

use super::{Result, SessionStore};
use crate::error::StoreError;

/// One directory holding `<run_id>.session.json` and `<run_id>.log.jsonl`.
///
/// Session files are replaced atomically (temp file + rename) so a reader
/// never sees a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("{}.session.json", file_stem(run_id)))
    }

    pub fn log_path(&self, run_id: &str) -> PathBuf {
        self.root.join(format!("{}.log.jsonl", file_stem(run_id)))
    }
}

/// Run ids come from callers; keep them inside the store directory.
fn file_stem(run_id: &str) -> String {
    run_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|source| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(bytes).map_err(|source| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source,
    })?;
    file.sync_all().map_err(|source| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source,
    })
}

impl SessionStore for FileSessionStore {
    fn save_session(&self, session: &RunSession) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|source| StoreError::Serialization { source })?;
        let path = self.session_path(&session.id);
        write_atomic(&path, &bytes)?;
        tracing::debug!(run_id = %session.id, status = %session.status, "saved session");
        Ok(())
    }

    fn load_session(&self, run_id: &str) -> Result<Option<RunSession>> {
        let path = self.session_path(run_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    operation: "read",
                    path,
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    fn append_event(&self, event: &ProgressEvent) -> Result<()> {
        let path = self.log_path(&event.session_id);
        let mut line =
            serde_json::to_vec(event).map_err(|source| StoreError::Serialization { source })?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Io {
                operation: "open",
                path: path.clone(),
                source,
            })?;
        file.write_all(&line).map_err(|source| StoreError::Io {
            operation: "append to",
            path,
            source,
        })
    }

    fn events(&self, run_id: &str) -> Result<Vec<ProgressEvent>> {
        let path = self.log_path(run_id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    operation: "open",
                    path,
                    source,
                });
            }
        };
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| StoreError::Io {
                operation: "read",
                path: path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use censo_model::{ProgressLevel, RunStatus};
    use tempfile::tempdir;

    #[test]
    fn session_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions")).unwrap();
        let mut session = RunSession::new("run-7", "actuario");
        session.begin_processing().unwrap();
        session.fail("sin datos").unwrap();
        store.save_session(&session).unwrap();

        let loaded = store.load_session("run-7").unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::Error);
        assert_eq!(loaded.error_message.as_deref(), Some("sin datos"));
        assert!(store.session_path("run-7").exists());
        assert!(!store.session_path("run-7").with_extension("json.tmp").exists());
    }

    #[test]
    fn log_lines_append_in_order() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        for message in ["a", "b", "c"] {
            store
                .append_event(&ProgressEvent::new("run-8", ProgressLevel::Info, message))
                .unwrap();
        }
        let events = store.events("run-8").unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].message, "c");
        assert!(store.events("missing").unwrap().is_empty());
        assert!(store.load_session("missing").unwrap().is_none());
    }

    #[test]
    fn run_ids_cannot_escape_the_directory() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let path = store.session_path("../../etc/passwd");
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        fs::write(store.session_path("bad"), b"{not json").unwrap();
        let err = store.load_session("bad").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.suggestion().is_some());
    }
}
