use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Byte storage behind the document service. Keys are relative paths in
/// the shape `{owner}/{document_id}-{file_name}`.
pub trait DocumentStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DocumentStoreError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, DocumentStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("storage key {0:?} is not a plain relative path")]
    InvalidKey(String),
    #[error("stored payload is missing")]
    Missing,
    #[error("document storage failed: {0}")]
    Io(#[from] io::Error),
}

/// Writes documents under a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskDocumentStore {
    root: PathBuf,
}

impl DiskDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> DiskDocumentStore {
        DiskDocumentStore { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, DocumentStoreError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(DocumentStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStore for DiskDocumentStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DocumentStoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, DocumentStoreError> {
        let path = self.resolve(key)?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(DocumentStoreError::Missing)
            }
            Err(err) => Err(DocumentStoreError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = DiskDocumentStore::new(dir.path());

        store
            .put("user-000101/doc-000001-resume.pdf", b"%PDF-1.4 stub")
            .expect("put succeeds");
        let bytes = store
            .get("user-000101/doc-000001-resume.pdf")
            .expect("get succeeds");

        assert_eq!(bytes, b"%PDF-1.4 stub");
    }

    #[test]
    fn missing_keys_are_reported_as_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = DiskDocumentStore::new(dir.path());

        assert!(matches!(
            store.get("user-000101/doc-000009-gone.pdf"),
            Err(DocumentStoreError::Missing)
        ));
    }

    #[test]
    fn keys_may_not_escape_the_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = DiskDocumentStore::new(dir.path());

        for key in ["../outside.txt", "/etc/passwd", ""] {
            assert!(matches!(
                store.put(key, b"nope"),
                Err(DocumentStoreError::InvalidKey(_))
            ));
        }
    }
}
