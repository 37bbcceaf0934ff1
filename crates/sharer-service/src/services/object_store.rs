//! S3-compatible object store client.
//!
//! Only single-object PUT is needed (publication records). Requests use
//! path-style addressing (`/{bucket}/{key}`) and AWS Signature Version 4,
//! which MinIO accepts with any region string.

use crate::config::ObjectStoreConfig;
use crate::observability::metrics::record_upstream_call;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::secret::{ExposeSecret, SecretString};
use reqwest::{Client, Url};
use ring::{digest, hmac};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{instrument, warn};

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-content-sha256;x-amz-date";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectStoreError {
    #[error("object store returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    Request(String),
}

/// Write access to object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` at `key` in `bucket`, replacing any existing object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;
}

/// SigV4-signing client for S3/MinIO.
pub struct S3ObjectStore {
    client: Client,
    base_url: String,
    access_key: String,
    secret_key: SecretString,
    region: String,
}

impl S3ObjectStore {
    /// # Errors
    ///
    /// Returns `ObjectStoreError::Request` if the HTTP client cannot be built.
    pub fn new(config: &ObjectStoreConfig, timeout: Duration) -> Result<Self, ObjectStoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ObjectStoreError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region: config.region.clone(),
        })
    }

    fn sign(&self, request: &CanonicalPut<'_>, now: DateTime<Utc>) -> String {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);

        let canonical = request.canonical_request(&amz_date);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            amz_date,
            scope,
            sha256_hex(canonical.as_bytes())
        );

        let key = signing_key(
            self.secret_key.expose_secret(),
            &date,
            &self.region,
            SERVICE,
        );
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            SIGNING_ALGORITHM, self.access_key, scope, SIGNED_HEADERS, signature
        )
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, body), fields(size = body.len()))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = object_path(bucket, key)?;
        let url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ObjectStoreError::Request(format!("invalid object URL: {}", e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ObjectStoreError::Request(
                    "object store URL has no host".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let payload_hash = sha256_hex(&body);
        let canonical = CanonicalPut {
            path: &path,
            host: &host,
            content_type,
            payload_hash: &payload_hash,
        };
        let authorization = self.sign(&canonical, now);

        let start = Instant::now();
        let response = self
            .client
            .put(url)
            .header("authorization", authorization)
            .header("content-type", content_type)
            .header("x-amz-date", now.format("%Y%m%dT%H%M%SZ").to_string())
            .header("x-amz-content-sha256", payload_hash)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                record_upstream_call("put_object", "error", start.elapsed());
                ObjectStoreError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            record_upstream_call("put_object", "success", start.elapsed());
            return Ok(());
        }

        record_upstream_call("put_object", "error", start.elapsed());
        let body = response.text().await.unwrap_or_default();
        warn!(
            target: "sharer.services.object_store",
            bucket = %bucket,
            status = %status,
            "Object store rejected PUT"
        );
        Err(ObjectStoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

/// Fields of a PUT that enter the signature.
struct CanonicalPut<'a> {
    path: &'a str,
    host: &'a str,
    content_type: &'a str,
    payload_hash: &'a str,
}

impl CanonicalPut<'_> {
    fn canonical_request(&self, amz_date: &str) -> String {
        format!(
            "PUT\n{}\n\ncontent-type:{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            self.path,
            self.content_type,
            self.host,
            self.payload_hash,
            amz_date,
            SIGNED_HEADERS,
            self.payload_hash
        )
    }
}

/// `/{bucket}/{key}` with every key segment URI-encoded; `/` separators kept.
fn object_path(bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
    check_key(bucket, key)?;

    let mut path = format!("/{}", uri_encode(bucket));
    for segment in key.split('/') {
        path.push('/');
        path.push_str(&uri_encode(segment));
    }
    Ok(path)
}

/// Reject `.` and `..` segments. URL parsing resolves them, so the request
/// path would no longer match the signed path.
fn check_key(bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
    let relative = std::iter::once(bucket)
        .chain(key.split('/'))
        .any(|segment| segment == "." || segment == "..");

    if relative {
        return Err(ObjectStoreError::Request(format!(
            "object key has a relative path segment: {}/{}",
            bucket, key
        )));
    }
    Ok(())
}

/// SigV4 URI encoding: everything except `A-Za-z0-9-._~` is percent-encoded.
fn uri_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Mock object store module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// One stored object.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredObject {
        pub bucket: String,
        pub key: String,
        pub body: Vec<u8>,
        pub content_type: String,
    }

    /// Records every PUT; optionally fails them all.
    #[derive(Default)]
    pub struct MockObjectStore {
        objects: Mutex<Vec<StoredObject>>,
        should_fail: AtomicBool,
    }

    impl MockObjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store that rejects every PUT with a 503.
        pub fn failing() -> Self {
            Self {
                objects: Mutex::new(Vec::new()),
                should_fail: AtomicBool::new(true),
            }
        }

        /// Objects stored so far, in order.
        pub fn objects(&self) -> Vec<StoredObject> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl ObjectStore for MockObjectStore {
        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), ObjectStoreError> {
            check_key(bucket, key)?;
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(ObjectStoreError::Http {
                    status: 503,
                    body: "mock failure".to_string(),
                });
            }
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(StoredObject {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    body,
                    content_type: content_type.to_string(),
                });
            Ok(())
        }
    }
}
