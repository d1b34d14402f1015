use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use harvester_core::Identifier;
use thiserror::Error;

use crate::persist::{parent_dir, AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to open ledger {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to record {id} in ledger {path:?}: {source}")]
    Append {
        id: String,
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to rewrite ledger: {0}")]
    Rewrite(#[from] PersistError),
}

/// Append-only, newline-delimited log of identifiers that need no further
/// attempt. Every mark is synced to disk before `mark_completed` returns.
#[derive(Debug)]
pub struct ProgressLedger {
    path: PathBuf,
    completed: HashSet<String>,
    file: File,
}

impl ProgressLedger {
    /// Load existing entries and open the file for appending.
    ///
    /// Unreadable content is tolerated (treated as no entries, with a
    /// warning); failing to open the file for writing is not.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let open_err = |source| LedgerError::Open {
            path: path.clone(),
            source,
        };

        let entries = read_entries(&path);
        fs::create_dir_all(parent_dir(&path)).map_err(open_err)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;

        // A crash mid-write can leave a final line without its newline.
        if ends_without_newline(&path) {
            file.write_all(b"\n").map_err(open_err)?;
            file.sync_data().map_err(open_err)?;
        }

        let completed: HashSet<String> = entries.into_iter().collect();
        engine_info!(
            "Loaded {} ledger entries from {:?}",
            completed.len(),
            path
        );
        Ok(Self {
            path,
            completed,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn has_completed(&self, id: &Identifier) -> bool {
        self.completed.contains(&id.key())
    }

    /// Durably append `id`. Already-present identifiers are not written twice.
    pub fn mark_completed(&mut self, id: &Identifier) -> Result<(), LedgerError> {
        let key = id.key();
        if self.completed.contains(&key) {
            return Ok(());
        }
        let line = format!("{key}\n");
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.sync_data())
            .map_err(|source| LedgerError::Append {
                id: key.clone(),
                path: self.path.clone(),
                source,
            })?;
        self.completed.insert(key);
        Ok(())
    }

    /// Remove entries so the next run attempts those identifiers again.
    /// Returns how many entries were removed.
    pub fn forget(path: &Path, ids: &[Identifier]) -> Result<usize, LedgerError> {
        let remove: HashSet<String> = ids.iter().map(Identifier::key).collect();
        let entries = read_entries(path);
        let kept: Vec<&String> = entries.iter().filter(|e| !remove.contains(*e)).collect();
        let removed = entries.len() - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let mut content = String::new();
        for entry in kept {
            content.push_str(entry);
            content.push('\n');
        }
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "progress.log".to_string());
        AtomicFileWriter::for_path(path).write(&filename, &content)?;
        Ok(removed)
    }
}

/// Identifiers recorded in the ledger file, in file order, without duplicates.
///
/// A missing file yields no entries. Lines that are not identifiers, including
/// lines with invalid UTF-8, are skipped with a warning.
pub fn read_entries(path: &Path) -> Vec<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            engine_warn!("Failed to read ledger {:?}: {} - treating as empty", path, err);
            return Vec::new();
        }
    };

    let content = String::from_utf8_lossy(&bytes);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<Identifier>() {
            Ok(id) => {
                let key = id.key();
                if seen.insert(key.clone()) {
                    entries.push(key);
                }
            }
            Err(err) => {
                engine_warn!(
                    "Ignoring ledger line {} in {:?}: {}",
                    index + 1,
                    path,
                    err
                );
            }
        }
    }
    entries
}

fn ends_without_newline(path: &Path) -> bool {
    fs::read(path)
        .ok()
        .and_then(|bytes| bytes.last().copied())
        .is_some_and(|last| last != b'\n')
}
