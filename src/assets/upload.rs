//! Sequential, fail-fast upload of a bundle to object storage.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use super::bundle::ModelBundle;
use super::error::UploadError;
use super::types::UploadLocation;

const DEFAULT_REGION: &str = "us-east-1";
const CREDENTIALS_PROVIDER_NAME: &str = "cesium-ion-upload";

/// Destination for individual objects.
#[async_trait]
pub trait ObjectSink: Send + Sync {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), UploadError>;
}

/// Builds an [`ObjectSink`] scoped to one set of upload credentials.
pub trait SinkFactory: Send + Sync {
    fn connect(&self, location: &UploadLocation) -> Result<Arc<dyn ObjectSink>, UploadError>;
}

/// What a successful [`Uploader::upload_all`] stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub objects: usize,
    pub bytes: u64,
}

/// Object key for a bundle entry: the server prefix followed by the relative path.
pub fn object_key(prefix: &str, relative_path: &str) -> String {
    format!("{prefix}{relative_path}")
}

/// Stores every file of a bundle, one object at a time.
///
/// The first failed object aborts the upload; later objects are never
/// attempted and nothing is retried.
#[derive(Clone)]
pub struct Uploader {
    factory: Arc<dyn SinkFactory>,
}

impl Uploader {
    pub fn new(factory: Arc<dyn SinkFactory>) -> Self {
        Self { factory }
    }

    /// Uploader backed by S3 with the credentials handed out by ion.
    pub fn s3() -> Self {
        Self::new(Arc::new(S3SinkFactory::default()))
    }

    #[instrument(skip_all, fields(objects = bundle.len(), prefix = %location.prefix))]
    pub async fn upload_all(
        &self,
        location: &UploadLocation,
        bundle: &ModelBundle,
    ) -> Result<UploadSummary, UploadError> {
        let sink = self.factory.connect(location)?;
        let mut summary = UploadSummary {
            objects: 0,
            bytes: 0,
        };
        for (path, content) in bundle.iter() {
            let key = object_key(&location.prefix, path);
            debug!(%key, size = content.len(), "uploading object");
            if let Err(err) = sink.put(&key, content.clone()).await {
                warn!(%key, error = %err, "upload aborted");
                return Err(err);
            }
            summary.objects += 1;
            summary.bytes += content.len() as u64;
        }
        Ok(summary)
    }
}

/// Creates S3 clients from ion's temporary credentials.
#[derive(Debug, Clone)]
pub struct S3SinkFactory {
    region: String,
}

impl Default for S3SinkFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl S3SinkFactory {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl SinkFactory for S3SinkFactory {
    fn connect(&self, location: &UploadLocation) -> Result<Arc<dyn ObjectSink>, UploadError> {
        if location.bucket.is_empty() {
            return Err(UploadError::Config("upload location has no bucket".to_string()));
        }
        let credentials = Credentials::new(
            location.access_key.clone(),
            location.secret_access_key.clone(),
            Some(location.session_token.clone()),
            None, // expiration is enforced server side
            CREDENTIALS_PROVIDER_NAME,
        );
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = location.endpoint.as_deref().filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(endpoint);
        }
        Ok(Arc::new(S3Sink {
            client: Client::from_conf(builder.build()),
            bucket: location.bucket.clone(),
        }))
    }
}

struct S3Sink {
    client: Client,
    bucket: String,
}

#[async_trait]
impl ObjectSink for S3Sink {
    async fn put(&self, key: &str, body: Bytes) -> Result<(), UploadError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| UploadError::Storage {
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_concatenates_prefix_and_path() {
        assert_eq!(object_key("abc123/", "images/tex.png"), "abc123/images/tex.png");
        assert_eq!(object_key("", "model.dae"), "model.dae");
    }

    #[test]
    fn s3_factory_rejects_missing_bucket() {
        let location = UploadLocation {
            bucket: String::new(),
            prefix: "p/".to_string(),
            access_key: "a".to_string(),
            secret_access_key: "s".to_string(),
            session_token: "t".to_string(),
            endpoint: None,
        };
        assert!(matches!(
            S3SinkFactory::default().connect(&location),
            Err(UploadError::Config(_))
        ));
    }
}
