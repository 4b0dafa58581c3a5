//! Create an ion asset, upload its source files and mark the upload complete.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::bundle::ModelBundle;
use super::error::PublishError;
use super::types::{AssetId, AssetMetadata, AssetRecord, CreateAssetRequest, OnComplete};
use super::upload::Uploader;
use crate::auth::AccessToken;
use crate::config::IonConfig;

/// Drives the create → upload → finalize sequence for one export.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ion_publish::assets::{AssetMetadata, AssetPublisher, ModelBundle, Uploader};
/// use ion_publish::auth::AccessToken;
/// use ion_publish::config::IonConfig;
///
/// # async fn example() -> Result<(), ion_publish::assets::PublishError> {
/// let publisher = AssetPublisher::new(Arc::new(IonConfig::new()), Uploader::s3());
/// let metadata = AssetMetadata::builder().name("Warehouse").build();
/// let bundle: ModelBundle = [("model.dae", b"<COLLADA/>".to_vec())].into_iter().collect();
/// let id = publisher.publish(&metadata, &bundle, &AccessToken::new("token")).await?;
/// println!("asset {id}");
/// # Ok(())
/// # }
/// ```
pub struct AssetPublisher {
    config: Arc<IonConfig>,
    client: reqwest::Client,
    uploader: Uploader,
}

impl AssetPublisher {
    pub fn new(config: Arc<IonConfig>, uploader: Uploader) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            uploader,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Publish `bundle` as a new asset and return its id.
    ///
    /// An upload failure skips finalization. The id is only returned once the
    /// completion callback answered `204 No Content`.
    pub async fn publish(
        &self,
        metadata: &AssetMetadata,
        bundle: &ModelBundle,
        token: &AccessToken,
    ) -> Result<AssetId, PublishError> {
        let record = self.create_asset(metadata, token).await?;
        let id = record.id();
        info!(asset_id = %id, files = bundle.len(), "asset created; uploading source files");

        let summary = self
            .uploader
            .upload_all(&record.upload_location, bundle)
            .await?;
        debug!(asset_id = %id, objects = summary.objects, bytes = summary.bytes, "upload finished");

        self.finalize(&record.on_complete, token).await?;
        info!(asset_id = %id, "upload finalized; tiling queued");
        Ok(id)
    }

    /// `POST /v1/assets` and parse the upload instructions.
    pub async fn create_asset(
        &self,
        metadata: &AssetMetadata,
        token: &AccessToken,
    ) -> Result<AssetRecord, PublishError> {
        let endpoint = self.config.assets_endpoint();
        debug!(%endpoint, name = %metadata.name, "creating asset");
        let resp = self
            .client
            .post(&endpoint)
            .query(&[("access_token", token.secret())])
            .json(&CreateAssetRequest::from(metadata))
            .send()
            .await
            .map_err(|e| PublishError::AssetCreateFailed(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(PublishError::AssetCreateFailed(format!(
                "assets endpoint returned status {status}"
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| PublishError::AssetCreateFailed(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| PublishError::AssetCreateFailed(format!("unexpected response: {e}")))
    }

    async fn finalize(&self, on_complete: &OnComplete, token: &AccessToken) -> Result<(), PublishError> {
        debug!(url = %on_complete.url, "finalizing upload");
        let resp = self
            .client
            .post(&on_complete.url)
            .query(&[("access_token", token.secret())])
            .json(&on_complete.fields)
            .send()
            .await
            .map_err(|e| PublishError::FinalizeFailed(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::NO_CONTENT {
            warn!(%status, "upload completion was not acknowledged");
            return Err(PublishError::FinalizeFailed(format!(
                "completion endpoint returned status {status}"
            )));
        }
        Ok(())
    }
}
