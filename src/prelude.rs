//! Convenience re-exports for common use.

pub use crate::assets::{
    AssetId, AssetMetadata, AssetPublisher, ModelBundle, Position, TextureFormat, Uploader,
};
pub use crate::auth::{AccessToken, AuthFlow, FileTokenStore, TokenStore};
pub use crate::config::IonConfig;
pub use crate::error::{IonError, Result};
pub use crate::export::{ExportOutcome, Exporter};
pub use crate::tiling::{TilingMonitor, TilingOutcome};
