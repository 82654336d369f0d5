//! DigitalOcean Spaces (S3-compatible) artifact store.
//!
//! Objects live under `{path_prefix}/{key}` in one bucket and are uploaded
//! with a `public-read` ACL so the CDN can serve them.

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use seance_transfer::normalize_key;

use crate::sigv4::{SigningKey, amz_date, authorization, encode_path, payload_hash};
use crate::{ArtifactStore, StorageError, StoreFuture, StoredObject};

const DEFAULT_PATH_PREFIX: &str = "prod";
const PUBLIC_READ: &str = "public-read";

/// Connection settings for a Spaces bucket.
#[derive(Clone)]
pub struct SpacesConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub region: String,
    /// Regional endpoint, e.g. `https://nyc3.digitaloceanspaces.com`.
    pub endpoint: String,
    /// Public CDN origin used to build object URLs.
    pub cdn_endpoint: String,
    /// Environment folder inside the bucket.
    pub path_prefix: String,
}

impl std::fmt::Debug for SpacesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpacesConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("cdn_endpoint", &self.cdn_endpoint)
            .field("path_prefix", &self.path_prefix)
            .finish()
    }
}

impl SpacesConfig {
    /// Reads the `SPACES_*` environment variables.
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Every variable except
    /// `SPACES_PATH_PREFIX` is required and must be non-empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::Config(format!("{name} is not set")))
        };

        Ok(Self {
            access_key_id: required("SPACES_ACCESS_KEY_ID")?,
            secret_access_key: required("SPACES_SECRET_ACCESS_KEY")?,
            bucket: required("SPACES_BUCKET")?,
            region: required("SPACES_REGION")?,
            endpoint: required("SPACES_ENDPOINT")?,
            cdn_endpoint: required("SPACES_CDN_ENDPOINT")?,
            path_prefix: lookup("SPACES_PATH_PREFIX")
                .map(|v| v.trim().trim_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PATH_PREFIX.to_string()),
        })
    }
}

/// Artifact store backed by a Spaces bucket.
pub struct SpacesStore {
    http: reqwest::Client,
    config: SpacesConfig,
    base_url: String,
    host: String,
}

impl SpacesStore {
    pub fn new(config: SpacesConfig) -> Result<Self, StorageError> {
        let (scheme, endpoint_host) = split_endpoint(&config.endpoint);
        if endpoint_host.is_empty() {
            return Err(StorageError::Config(format!(
                "invalid SPACES_ENDPOINT: {}",
                config.endpoint
            )));
        }

        // Virtual-hosted addressing: the bucket is a subdomain.
        let host = format!("{}.{endpoint_host}", config.bucket);
        let base_url = format!("{scheme}://{host}");

        tracing::info!(
            bucket = %config.bucket,
            region = %config.region,
            prefix = %config.path_prefix,
            "using Spaces artifact store"
        );

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            config,
            base_url,
            host,
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.host = split_endpoint(&url).1.to_string();
        self.base_url = url;
        self
    }

    /// Public CDN URL of an object.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{key}",
            self.config.cdn_endpoint.trim_end_matches('/'),
            self.config.path_prefix
        )
    }

    fn signing_key(&self) -> SigningKey<'_> {
        SigningKey {
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            region: &self.config.region,
        }
    }

    /// Encoded request path of an object: `/{prefix}/{key}`.
    fn object_path(&self, key: &str) -> String {
        encode_path(&format!("/{}/{key}", self.config.path_prefix))
    }

    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let key = normalize_key(key)?;
        let path = self.object_path(&key);
        let now = Utc::now();
        let date = amz_date(now);
        let hash = payload_hash(&data);
        let size = data.len() as u64;

        let auth = authorization(
            &self.signing_key(),
            "PUT",
            &path,
            &[
                ("host", self.host.as_str()),
                ("content-type", content_type),
                ("x-amz-acl", PUBLIC_READ),
                ("x-amz-content-sha256", hash.as_str()),
                ("x-amz-date", date.as_str()),
            ],
            &hash,
            now,
        )?;

        let resp = self
            .http
            .put(format!("{}{path}", self.base_url))
            .header(CONTENT_TYPE, content_type)
            .header("x-amz-acl", PUBLIC_READ)
            .header("x-amz-content-sha256", &hash)
            .header("x-amz-date", &date)
            .header(AUTHORIZATION, auth)
            .body(data)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                key,
                body,
            });
        }

        let url = self.public_url(&key);
        tracing::debug!(%url, size, "uploaded artifact");
        Ok(StoredObject {
            key,
            size,
            url: Some(url),
        })
    }

    async fn download(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = normalize_key(key)?;
        let path = self.object_path(&key);
        let now = Utc::now();
        let date = amz_date(now);
        let hash = payload_hash(b"");

        let auth = authorization(
            &self.signing_key(),
            "GET",
            &path,
            &[
                ("host", self.host.as_str()),
                ("x-amz-content-sha256", hash.as_str()),
                ("x-amz-date", date.as_str()),
            ],
            &hash,
            now,
        )?;

        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .header("x-amz-content-sha256", &hash)
            .header("x-amz-date", &date)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                key,
                body,
            });
        }

        Ok(Some(resp.bytes().await?.to_vec()))
    }
}

impl ArtifactStore for SpacesStore {
    fn name(&self) -> &'static str {
        "spaces"
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Vec<u8>,
        content_type: &'a str,
    ) -> StoreFuture<'a, StoredObject> {
        Box::pin(self.upload(key, data, content_type))
    }

    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Vec<u8>>> {
        Box::pin(self.download(key))
    }
}

/// Splits `https://host/...` into `("https", "host")`. A bare host gets `https`.
fn split_endpoint(endpoint: &str) -> (&str, &str) {
    let (scheme, rest) = match endpoint.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("https", endpoint),
    };
    let host = rest.split('/').next().unwrap_or_default();
    (scheme, host)
}
