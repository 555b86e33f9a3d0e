use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{MEDIA_IMAGE, MEDIA_VIDEO};

/// Lifetime of a presigned gallery upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Content types accepted into a gallery, with the media type and extension each maps to.
pub const ALLOWED_CONTENT_TYPES: [(&str, &str, &str); 6] = [
    ("image/jpeg", MEDIA_IMAGE, "jpg"),
    ("image/png", MEDIA_IMAGE, "png"),
    ("image/webp", MEDIA_IMAGE, "webp"),
    ("image/gif", MEDIA_IMAGE, "gif"),
    ("video/mp4", MEDIA_VIDEO, "mp4"),
    ("video/webm", MEDIA_VIDEO, "webm"),
];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("presigning failed: {0}")]
    Presign(String),
    #[error("object operation failed: {0}")]
    Object(String),
}

/// StorageService
///
/// Contract for the object storage holding gallery media. Swapped for
/// `MockStorageService` in tests so handlers never need a network connection.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called for the local MinIO setup.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary signed URL letting a client PUT `key` directly to the bucket.
    /// The signature binds `content_type`, so the upload must declare the same type.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// The URL the public page uses to display an object.
    fn public_url(&self, key: &str) -> String;
}

/// Maps an allowed content type to its media type (`image`/`video`) and file extension.
pub fn classify_content_type(content_type: &str) -> Option<(&'static str, &'static str)> {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(ct, _, _)| ct.eq_ignore_ascii_case(content_type.trim()))
        .map(|(_, media, ext)| (*media, *ext))
}

/// Object key for a new gallery upload: `memorials/{memorial_id}/{uuid}.{ext}`.
pub fn gallery_object_key(memorial_id: Uuid, extension: &str) -> String {
    format!("memorials/{}/{}.{}", memorial_id, Uuid::new_v4(), extension)
}

/// S3StorageClient
///
/// AWS SDK client that talks to MinIO locally and to the Supabase Storage S3 gateway in
/// production. Both need path-style addressing.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    endpoint: String,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket just errors; nothing to handle.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket: {:?}", e);
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Object(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket_name, sanitize_key(key))
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a key can never traverse outside its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Deterministic in-process storage used by tests.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every operation returns a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Presign("simulated failure".to_string()));
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }

    async fn delete_object(&self, _key: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Object("simulated failure".to_string()));
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://localhost:9000/mock-bucket/{}", sanitize_key(key))
    }
}

/// StorageState
///
/// The shared handle to the storage service stored in `AppState`.
pub type StorageState = Arc<dyn StorageService>;
