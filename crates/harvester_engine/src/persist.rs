use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Create the directory that will hold `file` and check that a temp file can
/// be written there, so an unusable output location fails before any work.
/// Returns the directory.
pub fn ensure_parent_dir(file: &Path) -> Result<PathBuf, PersistError> {
    let dir = parent_dir(file);
    let describe = |e: io::Error| PersistError::OutputDir(format!("{}: {}", dir.display(), e));
    match fs::metadata(&dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(_) => {}
        Err(_) => fs::create_dir_all(&dir).map_err(describe)?,
    }
    NamedTempFile::new_in(&dir).map_err(describe)?;
    Ok(dir)
}

/// Directory holding `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Atomically write content to `{dir}/{filename}` by writing a synced temp
/// file in the same directory, then renaming it over the target.
///
/// Readers see either the previous file or the complete new one.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Writer for the directory containing `path`.
    pub fn for_path(path: &Path) -> Self {
        Self::new(parent_dir(path))
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        if !self.dir.is_dir() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| PersistError::OutputDir(e.to_string()))?;
        }

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Rename replaces an existing target in one step.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        sync_dir(&self.dir)?;
        Ok(target)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
