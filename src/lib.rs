//! ion-publish: publish 3D models to Cesium ion.
//!
//! Covers the portable part of a modeling-app exporter: a loopback OAuth
//! login, creating an asset and uploading its source files with the
//! short-lived storage credentials ion hands out, and following the tiling
//! job until it completes or fails.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ion_publish::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = Arc::new(IonConfig::from_env()?);
//! let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
//! let exporter = Exporter::new(
//!     config.clone(),
//!     AuthFlow::new(config.clone(), store),
//!     AssetPublisher::new(config, Uploader::s3()),
//! );
//!
//! let bundle = ModelBundle::from_dir(std::path::Path::new("export/"))?;
//! let metadata = AssetMetadata::builder().name("Warehouse").build();
//! let outcome = exporter
//!     .export(&metadata, &bundle, |percent| println!("{percent:.0}%"))
//!     .await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod prelude;
pub mod tiling;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
