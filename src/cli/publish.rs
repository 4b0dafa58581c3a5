//! CLI handlers for publishing a model directory and following tiling.

use std::sync::Arc;

use crate::assets::{AssetId, AssetMetadata, AssetPublisher, ModelBundle, Position, Uploader};
use crate::auth::{AuthFlow, FileTokenStore, TokenStore};
use crate::cli::{PublishArgs, StatusArgs};
use crate::config::IonConfig;
use crate::export::{ExportOutcome, Exporter};
use crate::tiling::TilingMonitor;

/// Handle `ion-publish publish <dir>`.
pub async fn handle_publish(
    config: Arc<IonConfig>,
    args: PublishArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let bundle = ModelBundle::from_dir(&args.dir)?;
    if bundle.is_empty() {
        return Err(format!("{} contains no files to upload", args.dir.display()).into());
    }
    let metadata = metadata_from_args(&args);
    println!(
        "📦 Publishing {} file(s), {} bytes, as \"{}\"",
        bundle.len(),
        bundle.total_bytes(),
        metadata.name
    );

    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let exporter = Exporter::new(
        config.clone(),
        AuthFlow::new(config.clone(), store),
        AssetPublisher::new(config, Uploader::s3()),
    );

    if args.no_wait {
        match exporter.publish(&metadata, &bundle).await {
            Ok(asset_id) => {
                println!("✅ Upload complete. Asset {asset_id} is queued for tiling.");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(error = %e, "publish failed");
                return report(e.outcome());
            }
        }
    }

    let outcome = exporter
        .export(&metadata, &bundle, |percent| {
            println!("⏳ Tiling {percent:.0}%");
        })
        .await;
    report(outcome)
}

/// Handle `ion-publish status <asset-id>`.
pub async fn handle_status(
    config: Arc<IonConfig>,
    args: StatusArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileTokenStore::new(config.token_path.clone());
    let Some(token) = store.load()? else {
        return report(ExportOutcome::AccountInaccessible);
    };

    let asset_id = AssetId(args.asset_id);
    let handle = TilingMonitor::new(config, asset_id, token).start(
        |percent| println!("⏳ Tiling {percent:.0}%"),
        |_| {},
    );
    let outcome = match handle.wait().await {
        Some(Ok(asset_id)) => ExportOutcome::TilingSucceeded { asset_id },
        Some(Err(_)) | None => ExportOutcome::TilingFailed {
            asset_id: Some(asset_id),
        },
    };
    report(outcome)
}

fn metadata_from_args(args: &PublishArgs) -> AssetMetadata {
    let name = args.name.clone().unwrap_or_else(|| {
        args.dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Untitled model")
            .to_string()
    });
    let position = match (args.longitude, args.latitude, args.height) {
        (Some(longitude), Some(latitude), Some(height)) => Some(Position {
            longitude,
            latitude,
            height,
        }),
        _ => None,
    };
    AssetMetadata::builder()
        .name(name)
        .description(args.description.clone())
        .attribution(args.attribution.clone())
        .maybe_position(position)
        .texture_format(args.texture_format)
        .build()
}

fn report(outcome: ExportOutcome) -> Result<(), Box<dyn std::error::Error>> {
    if outcome.is_success() {
        println!("✅ {outcome}");
        Ok(())
    } else {
        Err(outcome.message().into())
    }
}
