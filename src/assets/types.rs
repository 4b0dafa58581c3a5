//! Request and response records for the ion assets endpoints.

use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Server-assigned asset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AssetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Texture compression requested for the tiled output.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TextureFormat {
    #[default]
    Auto,
    Ktx2,
    Webp,
}

/// Kind of source data; the exporter only ever uploads 3D models.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum SourceType {
    #[default]
    #[serde(rename = "3D_MODEL")]
    #[strum(serialize = "3D_MODEL")]
    ThreeDModel,
}

/// Georeference for the model origin, in degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.longitude, self.latitude, self.height].serialize(serializer)
    }
}

/// Caller-supplied description of the asset to create.
///
/// Defaulting an empty name or description is the caller's business; these
/// values go to the server as given.
///
/// # Example
/// ```
/// use ion_publish::assets::{AssetMetadata, Position, TextureFormat};
///
/// let metadata = AssetMetadata::builder()
///     .name("Warehouse")
///     .description("Exported from the modeling app")
///     .position(Position { longitude: -75.6, latitude: 40.0, height: 12.0 })
///     .texture_format(TextureFormat::Ktx2)
///     .build();
/// assert_eq!(metadata.attribution, "");
/// ```
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct AssetMetadata {
    #[builder(into)]
    pub name: String,
    #[builder(into, default)]
    pub description: String,
    #[builder(into, default)]
    pub attribution: String,
    pub position: Option<Position>,
    #[builder(default)]
    pub texture_format: TextureFormat,
}

/// Body of `POST /v1/assets`.
#[derive(Debug, Serialize)]
pub struct CreateAssetRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub asset_type: &'static str,
    pub description: &'a str,
    pub attribution: &'a str,
    pub options: AssetOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOptions {
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub texture_format: TextureFormat,
}

impl<'a> From<&'a AssetMetadata> for CreateAssetRequest<'a> {
    fn from(metadata: &'a AssetMetadata) -> Self {
        Self {
            name: &metadata.name,
            asset_type: "3DTILES",
            description: &metadata.description,
            attribution: &metadata.attribution,
            options: AssetOptions {
                source_type: SourceType::ThreeDModel,
                position: metadata.position,
                texture_format: metadata.texture_format,
            },
        }
    }
}

/// Response of `POST /v1/assets`: identity plus upload instructions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub asset_metadata: AssetSummary,
    pub upload_location: UploadLocation,
    pub on_complete: OnComplete,
}

impl AssetRecord {
    pub fn id(&self) -> AssetId {
        self.asset_metadata.id
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub id: AssetId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Short-lived object storage credentials scoped to one upload.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadLocation {
    pub bucket: String,
    pub prefix: String,
    pub access_key: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl fmt::Debug for UploadLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadLocation")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Where and what to POST once every file is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct OnComplete {
    #[serde(default)]
    pub method: Option<String>,
    pub url: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}
