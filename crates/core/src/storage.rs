use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::StoreError;

/// Durable home of the serialized document.
pub trait DocumentStorage: Send {
    /// Human-readable location used in logs and error messages.
    fn location(&self) -> &Path;

    /// Returns `Ok(None)` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StoreError>;

    fn write(&self, contents: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStorage for JsonFileStorage {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path: self.path.clone(), source }),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        let to_write_error = |source| StoreError::Write { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_write_error)?;
        }

        // Write beside the target then rename so a crash never leaves half a document.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents).map_err(to_write_error)?;
        fs::rename(&staging, &self.path).map_err(to_write_error)
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    contents: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// Storage kept in process memory. Clones share the same contents.
#[derive(Clone, Debug)]
pub struct InMemoryStorage {
    location: PathBuf,
    state: Arc<Mutex<InMemoryState>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self { location: PathBuf::from(":memory:"), state: Arc::default() }
    }
}

impl InMemoryStorage {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.state().contents = Some(contents.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.state().contents.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Makes every following write fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DocumentStorage for InMemoryStorage {
    fn location(&self) -> &Path {
        &self.location
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.contents())
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(StoreError::Write {
                path: self.location.clone(),
                source: io::Error::other("in-memory storage rejects writes"),
            });
        }
        state.contents = Some(contents.to_owned());
        state.writes += 1;
        Ok(())
    }
}
