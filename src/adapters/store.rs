//! Document store adapters.
//!
//! Implements [`DocumentStore`] for the JSON documents, and [`ConfigPort`]
//! for every document store.
//!
//! - [`FileStore`]: files under a root directory (the SPIFFS mount point
//!   on the device, any directory on the host).  Writes go to a temporary
//!   file that is then renamed over the target, so a power cut never
//!   leaves a half-written document.
//! - [`MemoryStore`]: in-memory map for simulation and tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::{ConfigError, ConfigPort, DocumentStore};
use crate::config::{CONFIG_DOCUMENT, TowerConfig, validate_config};
use crate::error::StoreError;

// ═══════════════════════════════════════════════════════════════
//  File-backed store
// ═══════════════════════════════════════════════════════════════

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document names are flat file names; anything with a path separator
    /// or a parent reference is refused.
    fn path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            warn!("FileStore: rejected document name {:?}", name);
            return Err(StoreError::Io);
        }
        Ok(self.root.join(name))
    }
}

impl DocumentStore for FileStore {
    fn read(&self, name: &str) -> Result<String, StoreError> {
        let path = self.path(name)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound,
            ErrorKind::InvalidData => StoreError::Corrupted,
            _ => {
                warn!("FileStore: read {} failed: {}", path.display(), e);
                StoreError::Io
            }
        })
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let tmp = self.root.join(format!("{name}.tmp"));
        fs::write(&tmp, contents)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| {
                warn!("FileStore: write {} failed: {}", path.display(), e);
                let _ = fs::remove_file(&tmp);
                StoreError::Io
            })?;
        debug!("FileStore: wrote {} ({} bytes)", name, contents.len());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_ok_and(|p| p.is_file())
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StoreError::Io),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  In-memory store
// ═══════════════════════════════════════════════════════════════

/// In-memory document map.  Can be switched read-only to simulate a
/// failing flash.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    docs: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subsequent writes and deletes fail with [`StoreError::Io`].
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, name: &str) -> Result<String, StoreError> {
        self.docs.get(name).cloned().ok_or(StoreError::NotFound)
    }

    fn write(&mut self, name: &str, contents: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Io);
        }
        self.docs.insert(name.to_owned(), contents.to_owned());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.docs.contains_key(name)
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Io);
        }
        self.docs.remove(name);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Configuration over any document store
// ═══════════════════════════════════════════════════════════════

impl<S: DocumentStore> ConfigPort for S {
    fn load_config(&self) -> Result<TowerConfig, ConfigError> {
        let text = match self.read(CONFIG_DOCUMENT) {
            Ok(text) => text,
            Err(StoreError::NotFound) => return Ok(TowerConfig::default()),
            Err(e) => return Err(e.into()),
        };
        let config: TowerConfig = serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn save_config(&mut self, config: &TowerConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let text = serde_json::to_string(config).map_err(|_| ConfigError::Corrupted)?;
        self.write(CONFIG_DOCUMENT, &text)?;
        Ok(())
    }
}
