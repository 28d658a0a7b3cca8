//! Durable storage for the saved-progress snapshot

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{Config, PersistenceBackend};
use crate::types::SavedProgress;

/// Errors that can occur while reading or writing saved progress
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backend the session writes snapshots to and reads them back from
pub trait ProgressStore: Send {
    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError>;
    fn save(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError>;
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// Keeps the snapshot in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    progress: Option<SavedProgress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError> {
        Ok(self.progress.clone())
    }

    fn save(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError> {
        self.progress = Some(progress.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.progress = None;
        Ok(())
    }
}

/// Stores the snapshot as pretty JSON in a single file
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<Option<SavedProgress>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, progress: &SavedProgress) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(progress)?;

        // Write to a sibling temp file, then rename over the snapshot
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "saved progress written");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Build the backend selected by configuration
pub fn store_from_config(config: &Config) -> Box<dyn ProgressStore> {
    match config.persistence.backend {
        PersistenceBackend::Memory => Box::new(MemoryProgressStore::new()),
        PersistenceBackend::File => Box::new(FileProgressStore::new(config.progress_path())),
    }
}
