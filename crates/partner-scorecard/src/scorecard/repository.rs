use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

/// Persistence boundary for the criteria (JSON) and ledger (CSV) snapshots.
/// Implementations move opaque text; parsing stays with the session.
pub trait SnapshotStore: Send + Sync {
    fn load_criteria(&self) -> Result<Option<String>, StoreError>;
    fn save_criteria(&self, snapshot: &str) -> Result<(), StoreError>;
    fn load_ledger(&self) -> Result<Option<String>, StoreError>;
    fn save_ledger(&self, snapshot: &str) -> Result<(), StoreError>;
}

/// Error enumeration for snapshot persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Stores snapshots as `criteria.json` and `partners.csv` files.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    criteria_path: PathBuf,
    ledger_path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(criteria_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            criteria_path: criteria_path.into(),
            ledger_path: ledger_path.into(),
        }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("criteria.json"), dir.join("partners.csv"))
    }

    fn read(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    // Replaces the file through a sibling temp file.
    fn write(path: &Path, snapshot: &str) -> Result<(), StoreError> {
        let to_error = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_error)?;
        }

        let staging = path.with_extension("tmp");
        fs::write(&staging, snapshot).map_err(to_error)?;
        fs::rename(&staging, path).map_err(to_error)?;
        debug!(path = %path.display(), bytes = snapshot.len(), "snapshot written");
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load_criteria(&self) -> Result<Option<String>, StoreError> {
        Self::read(&self.criteria_path)
    }

    fn save_criteria(&self, snapshot: &str) -> Result<(), StoreError> {
        Self::write(&self.criteria_path, snapshot)
    }

    fn load_ledger(&self) -> Result<Option<String>, StoreError> {
        Self::read(&self.ledger_path)
    }

    fn save_ledger(&self, snapshot: &str) -> Result<(), StoreError> {
        Self::write(&self.ledger_path, snapshot)
    }
}

/// Keeps snapshots in memory; used when nothing should touch disk.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    criteria: Mutex<Option<String>>,
    ledger: Mutex<Option<String>>,
}

impl InMemorySnapshotStore {
    pub fn with_snapshots(criteria: Option<String>, ledger: Option<String>) -> Self {
        Self {
            criteria: Mutex::new(criteria),
            ledger: Mutex::new(ledger),
        }
    }

    fn slot(slot: &Mutex<Option<String>>) -> Result<Option<String>, StoreError> {
        slot.lock()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Unavailable("snapshot mutex poisoned".to_string()))
    }

    fn fill(slot: &Mutex<Option<String>>, snapshot: &str) -> Result<(), StoreError> {
        let mut guard = slot
            .lock()
            .map_err(|_| StoreError::Unavailable("snapshot mutex poisoned".to_string()))?;
        *guard = Some(snapshot.to_string());
        Ok(())
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load_criteria(&self) -> Result<Option<String>, StoreError> {
        Self::slot(&self.criteria)
    }

    fn save_criteria(&self, snapshot: &str) -> Result<(), StoreError> {
        Self::fill(&self.criteria, snapshot)
    }

    fn load_ledger(&self) -> Result<Option<String>, StoreError> {
        Self::slot(&self.ledger)
    }

    fn save_ledger(&self, snapshot: &str) -> Result<(), StoreError> {
        Self::fill(&self.ledger, snapshot)
    }
}
