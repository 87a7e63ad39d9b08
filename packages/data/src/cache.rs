//! Per-file load cache.
//!
//! Holds the parsed contents of one file and hands out shared handles. An
//! entry is stale once the file's modification time or length differs from
//! what was recorded at load time.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use crate::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Result<Self, DataError> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Caches the result of loading one file.
#[derive(Debug)]
pub struct DataCache<T> {
    path: PathBuf,
    entry: Mutex<Option<(FileStamp, Arc<T>)>>,
}

impl<T> DataCache<T> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached value, loading it with `load` if nothing is cached
    /// or the file changed since the last load.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] if the file's metadata cannot be read, or
    /// whatever `load` returns. A failed load leaves the previous entry in
    /// place.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>, DataError>
    where
        F: FnOnce(&Path) -> Result<T, DataError>,
    {
        let stamp = FileStamp::read(&self.path)?;
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((cached, value)) = entry.as_ref()
            && *cached == stamp
        {
            log::trace!("Cache hit for {}", self.path.display());
            return Ok(Arc::clone(value));
        }

        log::debug!("Loading {}", self.path.display());
        let value = Arc::new(load(&self.path)?);
        *entry = Some((stamp, Arc::clone(&value)));
        drop(entry);

        Ok(value)
    }

    /// Drops the cached value so the next access reloads.
    pub fn invalidate(&self) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
