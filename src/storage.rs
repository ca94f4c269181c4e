use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Errors from the object store. Kept separate from `ServerError` so the
/// client-side image pipeline can use the store without the server types.
#[derive(Debug)]
pub enum StorageError {
    InvalidKey(String),
    NotFound(String),
    TooLarge { key: String, limit: u64 },
    Io(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidKey(key) => write!(f, "invalid object key: {key}"),
            StorageError::NotFound(key) => write!(f, "object not found: {key}"),
            StorageError::TooLarge { key, limit } => {
                write!(f, "object {key} exceeds {limit} byte limit")
            }
            StorageError::Io(msg) => write!(f, "storage io error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Flat object storage keyed by slash-separated names, the shape the
/// original backend's bucket exposed (`listings/{storageID}/photo_0.jpg`).
pub trait ObjectStore: Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetch an object, refusing anything over `max_len` bytes.
    fn get(&self, key: &str, max_len: u64) -> Result<Vec<u8>, StorageError>;

    /// Keys of every object under `prefix`, in no particular order.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Best-effort bulk delete: every object under `prefix` is attempted,
    /// and each outcome is reported individually.
    fn delete_prefix(&self, prefix: &str) -> Vec<(String, Result<(), StorageError>)> {
        let keys = match self.list(prefix) {
            Ok(keys) => keys,
            Err(e) => return vec![(prefix.to_string(), Err(e))],
        };
        keys.into_iter()
            .map(|key| {
                let result = self.delete(&key);
                (key, result)
            })
            .collect()
    }
}

/// Object store rooted at a directory on disk.
#[derive(Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a key onto a path under the root. Keys are relative,
    /// slash-separated, and may not climb out of the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let mut path = self.root.clone();
        for part in key.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return Err(StorageError::InvalidKey(key.to_string()));
            }
            path.push(part);
        }
        Ok(path)
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        fs::write(&path, bytes).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn get(&self, key: &str, max_len: u64) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(_) => return Err(StorageError::NotFound(key.to_string())),
        };
        if meta.len() > max_len {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                limit: max_len,
            });
        }
        fs::read(&path).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::Io(e.to_string()))?;
            if entry.path().is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                keys.push(format!("{}/{}", prefix.trim_end_matches('/'), name));
            }
        }
        Ok(keys)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        fs::remove_file(&path).map_err(|e| StorageError::Io(e.to_string()))?;
        // drop the folder once its last object is gone; harmless if not empty
        if let Some(parent) = path.parent() {
            if parent != self.root {
                let _ = fs::remove_dir(parent);
            }
        }
        Ok(())
    }
}
