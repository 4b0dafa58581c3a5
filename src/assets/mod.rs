//! Asset creation, source upload and upload finalization.

pub mod bundle;
pub mod error;
pub mod publisher;
pub mod types;
pub mod upload;

pub use bundle::ModelBundle;
pub use error::{BundleError, PublishError, UploadError};
pub use publisher::AssetPublisher;
pub use types::{
    AssetId, AssetMetadata, AssetRecord, OnComplete, Position, TextureFormat, UploadLocation,
};
pub use upload::{object_key, ObjectSink, S3SinkFactory, SinkFactory, UploadSummary, Uploader};
