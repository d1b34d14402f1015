use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use harvester_core::{compare_keys, HarvestedRecord};

use crate::persist::{AtomicFileWriter, PersistError};

/// How the persisted result file looked at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Missing,
    Loaded {
        records: usize,
        duplicates_dropped: usize,
    },
    /// Unreadable or not a JSON array of records; moved aside to `backup`
    /// when possible, and the run starts from an empty set.
    Corrupt {
        reason: String,
        backup: Option<PathBuf>,
    },
}

/// In-memory result set backed by a single JSON array file that is rewritten
/// whole on every checkpoint.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    records: Vec<HarvestedRecord>,
    ids: HashSet<String>,
}

impl ResultStore {
    /// Empty store that will write to `path`; nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Load previous results. Never fails; see [`ResultStore::load_with_status`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        Self::load_with_status(path).0
    }

    pub fn load_with_status(path: impl Into<PathBuf>) -> (Self, LoadStatus) {
        let mut store = Self::new(path);
        let content = match fs::read_to_string(&store.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return (store, LoadStatus::Missing);
            }
            Err(err) => {
                let status = store.quarantine(err.to_string());
                return (store, status);
            }
        };

        let loaded: Vec<HarvestedRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(err) => {
                let status = store.quarantine(err.to_string());
                return (store, status);
            }
        };

        let total = loaded.len();
        for record in loaded {
            store.append(record);
        }
        let duplicates_dropped = total - store.records.len();
        if duplicates_dropped > 0 {
            engine_warn!(
                "Dropped {} duplicate records while loading {:?}",
                duplicates_dropped,
                store.path
            );
        }
        engine_info!(
            "Loaded {} existing records from {:?}",
            store.records.len(),
            store.path
        );
        let status = LoadStatus::Loaded {
            records: store.records.len(),
            duplicates_dropped,
        };
        (store, status)
    }

    fn quarantine(&self, reason: String) -> LoadStatus {
        let backup = backup_path(&self.path);
        let backup = match fs::rename(&self.path, &backup) {
            Ok(()) => {
                engine_warn!(
                    "Corrupted results file {:?} ({}) - moved to {:?}, starting fresh.",
                    self.path,
                    reason,
                    backup
                );
                Some(backup)
            }
            Err(err) => {
                engine_warn!(
                    "Corrupted results file {:?} ({}) - starting fresh; could not back it up: {}",
                    self.path,
                    reason,
                    err
                );
                None
            }
        };
        LoadStatus::Corrupt { reason, backup }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[HarvestedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    /// Add a record unless its id is already present. Returns whether it was added.
    pub fn append(&mut self, record: HarvestedRecord) -> bool {
        if !self.ids.insert(record.id.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Write the whole current set atomically.
    pub fn checkpoint(&self) -> Result<PathBuf, PersistError> {
        let content = serde_json::to_string_pretty(&self.records)?;
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PersistError::OutputDir(format!("{:?} has no file name", self.path)))?;
        AtomicFileWriter::for_path(&self.path).write(&filename, &content)
    }

    /// Sort by identifier, then checkpoint.
    pub fn finalize(&mut self) -> Result<PathBuf, PersistError> {
        self.records.sort_by(|a, b| compare_keys(&a.id, &b.id));
        self.checkpoint()
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}
