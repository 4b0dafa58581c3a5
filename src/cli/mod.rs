//! CLI entry point for ion-publish.

pub mod auth;
pub mod publish;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::assets::TextureFormat;

/// Publish 3D models to Cesium ion
#[derive(Parser, Debug)]
#[command(name = "ion-publish", version, about = "Publish 3D models to Cesium ion")]
pub struct Cli {
    /// Optional TOML config file (environment variables still override it)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// Upload an exported model directory as a new asset
    Publish(PublishArgs),
    /// Follow the tiling progress of an existing asset
    Status(StatusArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in through the browser (replaces any saved token)
    Login,
    /// Show whether a token is saved
    Status,
    /// Delete the saved token
    Logout,
}

/// Arguments for `ion-publish publish`.
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Directory holding the exported model files
    pub dir: PathBuf,

    /// Asset name (defaults to the directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long, default_value = "")]
    pub description: String,

    #[arg(short, long, default_value = "")]
    pub attribution: String,

    /// Longitude of the model origin in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["latitude", "height"])]
    pub longitude: Option<f64>,

    /// Latitude of the model origin in degrees
    #[arg(long, allow_negative_numbers = true, requires_all = ["longitude", "height"])]
    pub latitude: Option<f64>,

    /// Height of the model origin in meters
    #[arg(long, allow_negative_numbers = true, requires_all = ["longitude", "latitude"])]
    pub height: Option<f64>,

    /// Texture format for the tiled output (auto, ktx2, webp)
    #[arg(long, default_value = "AUTO")]
    pub texture_format: TextureFormat,

    /// Return once the upload is finalized instead of waiting for tiling
    #[arg(long)]
    pub no_wait: bool,
}

/// Arguments for `ion-publish status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Asset id printed by `publish`
    pub asset_id: u64,
}
