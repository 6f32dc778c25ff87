use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DrawingStore, StoreError, StoreResult};
use crate::model::Drawing;
use crate::telemetry::LogManager;

/// Drawings persisted as a single JSON array in one file.
pub struct JsonFileStore {
    path: PathBuf,
    logger: LogManager,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            logger: LogManager::new("store"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the collection; `Ok(None)` when the file does not exist yet.
    pub fn try_load(&self) -> StoreResult<Option<Vec<Drawing>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let drawings = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(drawings))
    }

    pub fn try_save(&self, drawings: &[Drawing]) -> StoreResult<()> {
        let data = serde_json::to_vec(drawings).map_err(StoreError::Encode)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, data).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl DrawingStore for JsonFileStore {
    fn load(&self) -> Option<Vec<Drawing>> {
        match self.try_load() {
            Ok(Some(drawings)) => {
                self.logger.detail(&format!(
                    "loaded {} drawings from {}",
                    drawings.len(),
                    self.path.display()
                ));
                Some(drawings)
            }
            Ok(None) => {
                self.logger
                    .record(&format!("no stored drawings at {}", self.path.display()));
                None
            }
            Err(err) => {
                self.logger.warn(&format!("error loading drawings: {}", err));
                None
            }
        }
    }

    fn save(&self, drawings: &[Drawing]) -> bool {
        match self.try_save(drawings) {
            Ok(()) => {
                self.logger.detail(&format!(
                    "saved {} drawings to {}",
                    drawings.len(),
                    self.path.display()
                ));
                true
            }
            Err(err) => {
                self.logger.warn(&format!("error saving drawings: {}", err));
                false
            }
        }
    }
}
