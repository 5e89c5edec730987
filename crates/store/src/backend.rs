//! Key-value persistence backends.

use std::fs;
use std::path::{Path, PathBuf};

use creative_core::{CreativeError, CreativeResult};
use dashmap::DashMap;
use tracing::debug;

/// Local persistent key-value store holding one string value per key.
pub trait KeyValueBackend: Send + Sync {
    fn read(&self, key: &str) -> CreativeResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> CreativeResult<()>;
    fn remove(&self, key: &str) -> CreativeResult<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> CreativeResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CreativeError::persistence(key, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> CreativeResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CreativeError::persistence(key, e))?;
        let path = self.path_for(key);
        // Write-then-rename so a crash never leaves a truncated value behind.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| CreativeError::persistence(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| CreativeError::persistence(key, e))?;
        debug!(key, path = %path.display(), bytes = value.len(), "Key persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> CreativeResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CreativeError::persistence(key, e)),
        }
    }
}

/// Process-local backend backed by DashMap, for tests and dry runs.
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> CreativeResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn write(&self, key: &str, value: &str) -> CreativeResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CreativeResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("state"));

        assert_eq!(backend.read("history").unwrap(), None);
        backend.write("history", "[]").unwrap();
        assert_eq!(backend.read("history").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("state/history.json").exists());

        backend.remove("history").unwrap();
        assert_eq!(backend.read("history").unwrap(), None);
        backend.remove("history").unwrap();
    }

    #[test]
    fn memory_backend_overwrites() {
        let backend = MemoryBackend::new();
        backend.write("metaToken", "a").unwrap();
        backend.write("metaToken", "b").unwrap();
        assert_eq!(backend.read("metaToken").unwrap().as_deref(), Some("b"));
        assert_eq!(backend.len(), 1);
    }
}
