//! Router harness shared by the handler tests.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use seance_auth::{AuthScheme, BuilderAuthConfig, KeyVerifier};
use seance_storage::LocalStore;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use crate::{AppState, Distribution, router};

pub(crate) const BUILDER_KEY: &str = "ci-builder-secret";

pub(crate) struct TestApp {
    pub tmp: tempfile::TempDir,
    pub router: Router,
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

impl TestApp {
    /// App on a scratch directory, accepting [`BUILDER_KEY`].
    pub fn new() -> Self {
        let config = BuilderAuthConfig {
            scheme: AuthScheme::SharedSecret,
            key_hashes: vec![hex::encode(Sha256::digest(BUILDER_KEY.as_bytes()))],
            public_keys: vec![],
        };
        Self::with_verifier(KeyVerifier::from_config(&config).unwrap())
    }

    pub fn with_verifier(verifier: KeyVerifier) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::new(
            verifier,
            Arc::new(LocalStore::new(tmp.path())),
            Distribution::new("https://backend.seance.dev", "Seance"),
        );
        Self {
            router: router(state),
            tmp,
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Writes a file straight into the store root.
    pub fn seed(&self, key: &str, data: &[u8]) {
        let path = self.root().join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    /// Every file under the store root, as sorted `/`-separated keys.
    pub fn files(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![self.root().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(self.root()).unwrap();
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// JSON body of a deploy request.
pub(crate) fn deploy_body(files: &[(&str, &[u8])], clear_web: bool) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|(path, data)| serde_json::json!({"path": path, "content": STANDARD.encode(data)}))
        .collect();
    serde_json::json!({"files": files, "clearWeb": clear_web}).to_string()
}

/// `POST /deploy` with an optional `X-Builder-Key`.
pub(crate) fn deploy_request(builder_key: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/deploy")
        .header("content-type", "application/json");
    if let Some(key) = builder_key {
        builder = builder.header("x-builder-key", key);
    }
    builder.body(body.into()).unwrap()
}
