//! Applies a deploy batch to an artifact store.

use std::sync::Arc;

use seance_protocol::constants::WEB_PREFIX;
use seance_protocol::{DeployRequest, DeployedFile};
use seance_transfer::{
    TransferError, checksum_bytes, content_type_for, decode_content, normalize_key,
};

use crate::{ArtifactStore, StorageError};

/// Why a deploy batch failed.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    InvalidPath(TransferError),

    #[error(transparent)]
    InvalidContent(TransferError),

    #[error("clearWeb is not supported by the {0} store")]
    ClearUnsupported(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DeployError {
    /// True when the request itself was bad and nothing was written.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DeployError::Storage(_))
    }
}

/// Result of a successful deploy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployOutcome {
    /// Files written, in request order.
    pub files: Vec<DeployedFile>,
    /// Entries skipped for an empty path or empty content.
    pub skipped: usize,
}

/// A validated, decoded entry ready to be written.
struct PendingFile {
    key: String,
    data: Vec<u8>,
}

/// Writes deploy batches into a store.
#[derive(Clone)]
pub struct ArtifactWriter {
    store: Arc<dyn ArtifactStore>,
}

impl ArtifactWriter {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Validates the whole batch, then clears `web/` if asked, then writes
    /// each file in order.
    ///
    /// Bad paths, bad base64 and an unsupported clear are all reported
    /// before anything is touched. A store failure stops the batch; files
    /// already written stay in place.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployOutcome, DeployError> {
        let mut pending = Vec::with_capacity(request.files.len());
        let mut skipped = 0usize;

        for file in &request.files {
            if file.is_blank() {
                tracing::warn!(path = %file.path, "skipping entry with empty path or content");
                skipped += 1;
                continue;
            }

            let key = normalize_key(&file.path).map_err(DeployError::InvalidPath)?;
            let data = decode_content(&file.path, &file.content)
                .map_err(DeployError::InvalidContent)?;
            pending.push(PendingFile { key, data });
        }

        if request.clear_web && !self.store.supports_clear() {
            return Err(DeployError::ClearUnsupported(self.store.name()));
        }

        tracing::info!(
            store = self.store.name(),
            files = pending.len(),
            skipped,
            clear_web = request.clear_web,
            "deploy started"
        );

        if request.clear_web {
            self.store.clear_prefix(WEB_PREFIX).await.inspect_err(|e| {
                tracing::error!(error = %e, "failed to clear web directory");
            })?;
        }

        let mut files = Vec::with_capacity(pending.len());
        for PendingFile { key, data } in pending {
            let checksum = checksum_bytes(&data);
            let stored = self
                .store
                .put(&key, data, content_type_for(&key))
                .await
                .inspect_err(|e| {
                    tracing::error!(path = %key, error = %e, written = files.len(), "deploy aborted");
                })?;

            tracing::info!(path = %stored.key, size = stored.size, sha256 = %checksum, "deployed file");
            files.push(DeployedFile {
                path: stored.key,
                size: stored.size,
                url: stored.url,
            });
        }

        tracing::info!(files = files.len(), "deploy finished");
        Ok(DeployOutcome { files, skipped })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use base64::{Engine, engine::general_purpose::STANDARD};
    use seance_protocol::DeployFile;

    use super::*;
    use crate::{CLEAR_MARKER, LocalStore, StoreFuture, StoredObject};

    fn entry(path: &str, data: &[u8]) -> DeployFile {
        DeployFile {
            path: path.into(),
            content: STANDARD.encode(data),
        }
    }

    fn request(files: Vec<DeployFile>, clear_web: bool) -> DeployRequest {
        DeployRequest { files, clear_web }
    }

    fn local() -> (tempfile::TempDir, ArtifactWriter) {
        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(Arc::new(LocalStore::new(tmp.path())));
        (tmp, writer)
    }

    fn list_files(root: &Path) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    out.push(
                        path.strip_prefix(root)
                            .unwrap()
                            .to_string_lossy()
                            .replace('\\', "/"),
                    );
                }
            }
        }
        out.sort();
        out
    }

    /// Store that delegates to a local directory but fails the Nth put.
    struct FailingStore {
        inner: LocalStore,
        fail_at: usize,
        puts: AtomicUsize,
    }

    impl ArtifactStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn put<'a>(
            &'a self,
            key: &'a str,
            data: Vec<u8>,
            content_type: &'a str,
        ) -> StoreFuture<'a, StoredObject> {
            if self.puts.fetch_add(1, Ordering::SeqCst) == self.fail_at {
                let err = std::io::Error::other("disk full");
                return Box::pin(std::future::ready(Err(StorageError::io(key, err))));
            }
            self.inner.put(key, data, content_type)
        }

        fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
            self.inner.get(key)
        }
    }

    #[tokio::test]
    async fn writes_decoded_bytes() {
        let (tmp, writer) = local();
        let binary = [0u8, 159, 146, 150, 255];
        let outcome = writer
            .deploy(&request(
                vec![
                    entry("releases/version.json", br#"{"desktop":{"version":"1.0.0"}}"#),
                    entry("releases/darwin-arm64/blob.bin", &binary),
                ],
                false,
            ))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 2);
        assert_eq!(outcome.files[1].path, "releases/darwin-arm64/blob.bin");
        assert_eq!(outcome.files[1].size, 5);
        assert_eq!(
            std::fs::read(tmp.path().join("releases/darwin-arm64/blob.bin")).unwrap(),
            binary
        );
    }

    #[tokio::test]
    async fn traversal_anywhere_writes_nothing() {
        let (tmp, writer) = local();
        let err = writer
            .deploy(&request(
                vec![
                    entry("releases/ok.json", b"{}"),
                    entry("../escape.txt", b"pwned"),
                ],
                false,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::InvalidPath(_)));
        assert!(err.is_client_error());
        assert!(list_files(tmp.path()).is_empty());
        assert!(!tmp.path().parent().unwrap().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn absolute_path_rejected() {
        let (tmp, writer) = local();
        let err = writer
            .deploy(&request(vec![entry("/etc/cron.d/x", b"x")], false))
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPath(_)));
        assert!(list_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn bad_base64_writes_nothing() {
        let (tmp, writer) = local();
        let files = vec![
            entry("web/index.html", b"<html>"),
            DeployFile {
                path: "web/app.js".into(),
                content: "%%% not base64 %%%".into(),
            },
        ];
        let err = writer.deploy(&request(files, false)).await.unwrap_err();
        assert!(matches!(err, DeployError::InvalidContent(_)));
        assert!(list_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn accepts_wrapped_and_unpadded_content() {
        let (tmp, writer) = local();
        let payload: Vec<u8> = (0..200u8).collect();
        let wrapped = STANDARD
            .encode(&payload)
            .as_bytes()
            .chunks(76)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        let files = vec![
            DeployFile {
                path: "web/a.bin".into(),
                content: wrapped,
            },
            DeployFile {
                path: "web/x.txt".into(),
                content: "eA".into(),
            },
        ];

        let outcome = writer.deploy(&request(files, false)).await.unwrap();
        assert_eq!(outcome.files[0].size, 200);
        assert_eq!(std::fs::read(tmp.path().join("web/a.bin")).unwrap(), payload);
        assert_eq!(std::fs::read(tmp.path().join("web/x.txt")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn blank_entries_are_skipped() {
        let (tmp, writer) = local();
        let files = vec![
            DeployFile {
                path: String::new(),
                content: STANDARD.encode(b"x"),
            },
            DeployFile {
                path: "web/empty.txt".into(),
                content: String::new(),
            },
            entry("web/index.html", b"<html>"),
        ];
        let outcome = writer.deploy(&request(files, false)).await.unwrap();
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(list_files(tmp.path()), vec!["web/index.html"]);
    }

    #[tokio::test]
    async fn clear_web_leaves_only_new_files() {
        let (tmp, writer) = local();
        writer
            .deploy(&request(
                vec![
                    entry("web/old.js", b"old"),
                    entry("web/assets/old.css", b"old"),
                    entry("releases/version.json", b"{}"),
                ],
                false,
            ))
            .await
            .unwrap();

        writer
            .deploy(&request(
                vec![
                    entry("web/index.html", b"<html>"),
                    entry("web/assets/app-1234.js", b"js"),
                ],
                true,
            ))
            .await
            .unwrap();

        let mut web: Vec<_> = list_files(tmp.path())
            .into_iter()
            .filter(|p| p.starts_with("web/"))
            .collect();
        web.sort();
        assert_eq!(
            web,
            vec![
                format!("web/{CLEAR_MARKER}"),
                "web/assets/app-1234.js".to_string(),
                "web/index.html".to_string(),
            ]
        );
        // Outside web/ is untouched.
        assert!(tmp.path().join("releases/version.json").exists());
    }

    #[tokio::test]
    async fn clear_web_refused_before_writing_when_unsupported() {
        struct NoClear(LocalStore);
        impl ArtifactStore for NoClear {
            fn name(&self) -> &'static str {
                "noclear"
            }
            fn put<'a>(
                &'a self,
                key: &'a str,
                data: Vec<u8>,
                content_type: &'a str,
            ) -> StoreFuture<'a, StoredObject> {
                self.0.put(key, data, content_type)
            }
            fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
                self.0.get(key)
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(Arc::new(NoClear(LocalStore::new(tmp.path()))));
        let err = writer
            .deploy(&request(vec![entry("web/index.html", b"x")], true))
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::ClearUnsupported("noclear")));
        assert!(list_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn store_failure_keeps_earlier_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FailingStore {
            inner: LocalStore::new(tmp.path()),
            fail_at: 1,
            puts: AtomicUsize::new(0),
        };
        let writer = ArtifactWriter::new(Arc::new(store));

        let err = writer
            .deploy(&request(
                vec![
                    entry("releases/a.bin", b"a"),
                    entry("releases/b.bin", b"b"),
                    entry("releases/c.bin", b"c"),
                ],
                false,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Storage(StorageError::Io { .. })));
        assert!(!err.is_client_error());
        assert_eq!(list_files(tmp.path()), vec!["releases/a.bin"]);
    }

    #[tokio::test]
    async fn redeploy_overwrites() {
        let (tmp, writer) = local();
        for body in [b"1.0.0".as_slice(), b"1.0.1".as_slice()] {
            writer
                .deploy(&request(vec![entry("releases/version.txt", body)], false))
                .await
                .unwrap();
        }
        assert_eq!(
            std::fs::read(tmp.path().join("releases/version.txt")).unwrap(),
            b"1.0.1"
        );
    }
}
