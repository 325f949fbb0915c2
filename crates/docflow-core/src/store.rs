//! Loading and writing documents.

use crate::document::{Document, format_from_name};
use crate::error::ConvertError;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Loads a document from a path.
pub trait DocumentLoader: Send + Sync {
    /// Fails with [`ConvertError::NotFound`] when nothing exists at `path`.
    fn load(&self, path: &Path) -> Result<Document, ConvertError>;
}

/// Writes document bytes to a path.
pub trait DocumentWriter: Send + Sync {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ConvertError>;
}

/// Name and format for a document loaded from `path`.
fn describe(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = format_from_name(&name);
    (name, format)
}

/// Filesystem-backed loader and writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for FsStore {
    fn load(&self, path: &Path) -> Result<Document, ConvertError> {
        if !path.exists() {
            return Err(ConvertError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        let (name, format) = describe(path);
        debug!("loaded {} ({} bytes)", path.display(), content.len());
        Ok(Document::named(content, format, name))
    }
}

impl DocumentWriter for FsStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
        std::fs::write(path, bytes).map_err(|e| ConvertError::io(path, e))?;
        debug!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// In-memory loader and writer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<IndexMap<PathBuf, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(path.into(), bytes.into());
    }

    /// Builder-style variant of [`MemoryStore::insert`].
    pub fn with_file(self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Read back a stored file.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<PathBuf, Vec<u8>>> {
        // A poisoned map is still a valid map
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DocumentLoader for MemoryStore {
    fn load(&self, path: &Path) -> Result<Document, ConvertError> {
        let content = self.get(path).ok_or_else(|| ConvertError::NotFound {
            path: path.to_path_buf(),
        })?;
        let (name, format) = describe(path);
        Ok(Document::named(content, format, name))
    }
}

impl DocumentWriter for MemoryStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
        self.insert(path, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pdf");

        FsStore.write(&path, b"This is a sample PDF document").unwrap();
        let doc = FsStore.load(&path).unwrap();

        assert_eq!(doc.name(), "sample.pdf");
        assert_eq!(doc.format(), "PDF");
        assert_eq!(doc.size(), 29);
    }

    #[test]
    fn test_fs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsStore.load(&dir.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, ConvertError::NotFound { .. }));
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_fs_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README");
        std::fs::write(&path, "x").unwrap();

        assert_eq!(FsStore.load(&path).unwrap().format(), "UNKNOWN");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with_file("in/photo.jpeg", b"img".to_vec());

        let doc = store.load(Path::new("in/photo.jpeg")).unwrap();
        assert_eq!(doc.name(), "photo.jpeg");
        assert_eq!(doc.format(), "JPEG");

        assert!(matches!(
            store.load(Path::new("in/missing.png")),
            Err(ConvertError::NotFound { .. })
        ));

        store.write(Path::new("out/photo.pdf"), b"pdf").unwrap();
        assert_eq!(store.get("out/photo.pdf"), Some(b"pdf".to_vec()));
        assert_eq!(store.len(), 2);
    }
}
