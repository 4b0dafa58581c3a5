//! End-to-end export: authenticate, publish, then follow tiling to the end.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::assets::{AssetId, AssetMetadata, AssetPublisher, ModelBundle};
use crate::auth::AuthFlow;
use crate::config::IonConfig;
use crate::error::IonError;
use crate::tiling::TilingMonitor;

/// The four notifications an export can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    AccountInaccessible,
    ExportFailed,
    TilingFailed { asset_id: Option<AssetId> },
    TilingSucceeded { asset_id: AssetId },
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::TilingSucceeded { .. })
    }

    /// Short, non-technical text for the user.
    pub fn message(&self) -> String {
        match self {
            Self::AccountInaccessible => "Could not access your Cesium ion account.".to_string(),
            Self::ExportFailed => "The model could not be uploaded to Cesium ion.".to_string(),
            Self::TilingFailed { .. } => "Cesium ion could not tile the model.".to_string(),
            Self::TilingSucceeded { asset_id } => {
                format!("Your model is ready on Cesium ion (asset {asset_id}).")
            }
        }
    }
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Wires [`AuthFlow`], [`AssetPublisher`] and [`TilingMonitor`] together.
pub struct Exporter {
    config: Arc<IonConfig>,
    auth: AuthFlow,
    publisher: AssetPublisher,
    client: reqwest::Client,
}

impl Exporter {
    pub fn new(config: Arc<IonConfig>, auth: AuthFlow, publisher: AssetPublisher) -> Self {
        Self {
            config,
            auth,
            publisher,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Authenticate and publish; returns as soon as ion has the upload.
    pub async fn publish(
        &self,
        metadata: &AssetMetadata,
        bundle: &ModelBundle,
    ) -> Result<AssetId, IonError> {
        let token = self.auth.authenticate().await?;
        Ok(self.publisher.publish(metadata, bundle, &token).await?)
    }

    /// Authenticate, publish and wait for tiling to reach a terminal state.
    pub async fn try_export<P>(
        &self,
        metadata: &AssetMetadata,
        bundle: &ModelBundle,
        on_progress: P,
    ) -> Result<AssetId, IonError>
    where
        P: FnMut(f64) + Send + 'static,
    {
        let token = self.auth.authenticate().await?;
        let asset_id = self.publisher.publish(metadata, bundle, &token).await?;

        let handle = TilingMonitor::new(self.config.clone(), asset_id, token)
            .with_client(self.client.clone())
            .start(on_progress, |_| {});
        match handle.wait().await {
            Some(Ok(id)) => Ok(id),
            Some(Err(failure)) => Err(IonError::Tiling { asset_id, failure }),
            None => Err(IonError::Cancelled(asset_id)),
        }
    }

    /// [`try_export`](Self::try_export) collapsed into a host notification.
    pub async fn export<P>(
        &self,
        metadata: &AssetMetadata,
        bundle: &ModelBundle,
        on_progress: P,
    ) -> ExportOutcome
    where
        P: FnMut(f64) + Send + 'static,
    {
        match self.try_export(metadata, bundle, on_progress).await {
            Ok(asset_id) => {
                info!(%asset_id, "export finished");
                ExportOutcome::TilingSucceeded { asset_id }
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                err.outcome()
            }
        }
    }
}
