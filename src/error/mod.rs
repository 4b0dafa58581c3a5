//! Top-level error type for ion publishing.

use thiserror::Error;

use crate::assets::{BundleError, PublishError};
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::export::ExportOutcome;
use crate::tiling::MonitorFailure;

/// Any failure along the authenticate → publish → tile pipeline.
#[derive(Error, Debug)]
pub enum IonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Tiling error: {asset_id}: {failure}")]
    Tiling {
        asset_id: crate::assets::AssetId,
        failure: MonitorFailure,
    },

    #[error("Monitoring of asset {0} was cancelled")]
    Cancelled(crate::assets::AssetId),
}

impl IonError {
    /// The host notification this failure is reported as.
    pub fn outcome(&self) -> ExportOutcome {
        match self {
            Self::Auth(_) => ExportOutcome::AccountInaccessible,
            Self::Config(_) | Self::Bundle(_) | Self::Publish(_) => ExportOutcome::ExportFailed,
            Self::Tiling { asset_id, .. } | Self::Cancelled(asset_id) => {
                ExportOutcome::TilingFailed {
                    asset_id: Some(*asset_id),
                }
            }
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, IonError>;
