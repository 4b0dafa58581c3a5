use std::path::PathBuf;

use thiserror::Error;

/// Object storage failures while pushing a bundle.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to store {key}: {message}")]
    Storage { key: String, message: String },
    #[error("invalid upload location: {0}")]
    Config(String),
}

/// Failures of the create → upload → finalize sequence.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("asset creation failed: {0}")]
    AssetCreateFailed(String),
    #[error("upload failed: {0}")]
    UploadFailed(#[from] UploadError),
    #[error("upload finalization failed: {0}")]
    FinalizeFailed(String),
}

/// Failures while reading an exported model directory into a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("could not read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
