//! Persistence backends for the stored preference.
//!
//! The controller only needs a string key-value store with synchronous reads
//! and writes. Three implementations ship with the crate:
//!
//! - [`FileStore`]: a JSON object on disk, for real applications.
//! - [`MemoryStore`]: a shared in-process map, for tests and embedding.
//! - [`UnavailableStore`]: fails every call, for running without persistence
//!   or exercising the degraded path.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::SchemeError;

/// Key under which the preference is persisted.
pub const STORAGE_KEY: &str = "btfcss-color-scheme";

/// A synchronous string key-value store.
pub trait PreferenceStore {
    /// Reads `key`. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, SchemeError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SchemeError>;
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, SchemeError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SchemeError> {
        (**self).set(key, value)
    }
}

// === File store ===

/// Stores preferences as a flat JSON object in a single file.
///
/// The file is read on every `get` so edits made by other processes are
/// picked up on the next load. Unknown keys are preserved on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SchemeError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => {
                return Err(SchemeError::io(
                    format!("cannot read {}", self.path.display()),
                    err,
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|source| SchemeError::MalformedStore {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SchemeError> {
        let map = self.read_map()?;
        Ok(map.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SchemeError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                SchemeError::io(format!("cannot create {}", parent.display()), err)
            })?;
        }

        let mut body = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|err| SchemeError::unavailable(err.to_string()))?;
        body.push('\n');

        // Write beside the target and rename so readers never see a torn file.
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error =
            |err: io::Error| SchemeError::io(format!("cannot write {}", self.path.display()), err);

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(body.as_bytes()).map_err(write_error)?;
        tmp.persist(&self.path)
            .map_err(|err| write_error(err.error))?;
        Ok(())
    }
}

// === Memory store ===

/// In-memory store. Clones share the same map, so a clone kept by a test sees
/// everything the controller writes, and survives the controller being dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.values.borrow_mut().insert(key.into(), value.into());
        store
    }

    /// Current value of `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    /// Number of successful `set` calls across all clones.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SchemeError> {
        Ok(self.value(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SchemeError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

// === Unavailable store ===

/// A store that rejects every read and write.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore {
    reason: Option<String>,
}

impl UnavailableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `reason` in the reported errors.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }

    fn error(&self) -> SchemeError {
        SchemeError::unavailable(
            self.reason
                .clone()
                .unwrap_or_else(|| "persistence disabled".to_string()),
        )
    }
}

impl PreferenceStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, SchemeError> {
        Err(self.error())
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), SchemeError> {
        Err(self.error())
    }
}
