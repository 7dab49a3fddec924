//! Named-file storage under a serving directory.

use crate::http::handler::HandlerError;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("serving directory {0:?} does not exist")]
    Unavailable(PathBuf),
    #[error("i/o error on {name:?}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> HandlerError {
        match e {
            StoreError::NotFound(_) => HandlerError::NotFound,
            StoreError::InvalidName(_) => HandlerError::BadRequest(e.to_string()),
            StoreError::Unavailable(_) | StoreError::Io { .. } => HandlerError::Internal(e.into()),
        }
    }
}

pub trait FileStore: Send + Sync {
    /// Confirms the store can serve requests at all.
    fn check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError>;
}

/// Files under a root directory. Names are used as given except that they
/// may not climb out of the root. Writes to the same name are serialized.
pub struct DirStore {
    root: PathBuf,
    write_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> DirStore {
        DirStore {
            root: root.into(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        let path = Path::new(name);
        let plain = path.components().all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !plain {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(path))
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}

impl FileStore for DirStore {
    fn check(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(StoreError::Unavailable(self.root.clone())),
        }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(name)?;
        fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io {
                name: name.to_string(),
                source,
            },
        })
    }

    fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name)?;
        let lock = self.lock_for(&path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        fs::write(&path, content).map_err(|source| StoreError::Io {
            name: name.to_string(),
            source,
        })
    }
}
