//! Artifact store backed by a local directory.

use std::path::{Path, PathBuf};

use seance_transfer::resolve_within_root;

use crate::{ArtifactStore, CLEAR_MARKER, StorageError, StoreFuture, StoredObject};

/// Stores artifacts as plain files under `root`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        Ok(resolve_within_root(&self.root, key)?)
    }
}

impl LocalStore {
    async fn write(&self, key: &str, data: Vec<u8>) -> Result<StoredObject, StorageError> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(key, e))?;
        }

        let size = data.len() as u64;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        tracing::debug!(path = %path.display(), size, "wrote artifact");
        Ok(StoredObject {
            key: key.to_string(),
            size,
            url: None,
        })
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(key)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(key, e)),
        }

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn clear(&self, prefix: &str) -> Result<(), StorageError> {
        let dir = self.resolve(prefix)?;

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::info!(dir = %dir.display(), "cleared directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(prefix, e)),
        }

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(prefix, e))?;
        tokio::fs::write(dir.join(CLEAR_MARKER), b"")
            .await
            .map_err(|e| StorageError::io(prefix, e))?;
        Ok(())
    }
}

impl ArtifactStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        _content_type: &'a str,
    ) -> StoreFuture<'a, StoredObject> {
        Box::pin(self.write(key, data))
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(self.read(key))
    }

    fn supports_clear(&self) -> bool {
        true
    }

    fn clear_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(self.clear(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStore::new(tmp.path());
        (tmp, store)
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let (_tmp, store) = store();
        let data = vec![0u8, 1, 2, 255, 254];

        let obj = store
            .put("releases/darwin-arm64/a.bin", data.clone(), "application/octet-stream")
            .await
            .unwrap();
        assert_eq!(obj.size, 5);
        assert!(obj.url.is_none());

        let read = store.get("releases/darwin-arm64/a.bin").await.unwrap();
        assert_eq!(read, Some(data));
    }

    #[tokio::test]
    async fn put_overwrites() {
        let (_tmp, store) = store();
        store.put("web/index.html", b"old".to_vec(), "text/html").await.unwrap();
        store.put("web/index.html", b"new".to_vec(), "text/html").await.unwrap();
        assert_eq!(store.get("web/index.html").await.unwrap().unwrap(), b"new");
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let (_tmp, store) = store();
        assert_eq!(store.get("releases/version.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_directory_is_none() {
        let (tmp, store) = store();
        std::fs::create_dir_all(tmp.path().join("web/assets")).unwrap();
        assert_eq!(store.get("web/assets").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.put("../evil", b"x".to_vec(), "text/plain").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("/etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn clear_prefix_empties_directory() {
        let (tmp, store) = store();
        store.put("web/old.js", b"1".to_vec(), "application/javascript").await.unwrap();
        store.put("web/nested/old.css", b"2".to_vec(), "text/css").await.unwrap();
        store.put("releases/version.json", b"{}".to_vec(), "application/json").await.unwrap();

        store.clear_prefix("web").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("web"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![CLEAR_MARKER.to_string()]);
        // Other prefixes are untouched.
        assert!(store.get("releases/version.json").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_prefix_creates_missing_directory() {
        let (tmp, store) = store();
        store.clear_prefix("web").await.unwrap();
        assert!(tmp.path().join("web").join(CLEAR_MARKER).exists());
    }
}
