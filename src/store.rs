//! Key/value persistence for learner progress.
//!
//! Stores hold raw JSON text per key. Typed reads never fail: absent or corrupt
//! values fall back to `T::default()` so a damaged file cannot block a session.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::EngineResult;
use crate::types::Progress;

pub const PROGRESS_KEY: &str = "progress";

pub trait ProgressStore: Send + Sync {
    fn read_raw(&self, key: &str) -> EngineResult<Option<String>>;

    fn write_raw(&self, key: &str, value: &str) -> EngineResult<()>;

    fn get_item<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
        Self: Sized,
    {
        let raw = match self.read_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value, using default");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "stored value is corrupt, using default");
            T::default()
        })
    }

    fn set_item<T>(&self, key: &str, value: &T) -> EngineResult<()>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.write_raw(key, &raw)
    }

    fn get_progress(&self) -> Progress
    where
        Self: Sized,
    {
        self.get_item(PROGRESS_KEY)
    }

    fn save_progress(&self, progress: &Progress) -> EngineResult<()>
    where
        Self: Sized,
    {
        self.set_item(PROGRESS_KEY, progress)
    }
}

// ============================================================
// MemoryStore
// ============================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn read_raw(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn write_raw(&self, key: &str, value: &str) -> EngineResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================
// JsonFileStore
// ============================================================

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened json file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl ProgressStore for JsonFileStore {
    fn read_raw(&self, key: &str) -> EngineResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_raw(&self, key: &str, value: &str) -> EngineResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}
