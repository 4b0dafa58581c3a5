use serde::Deserialize;

/// Body of `GET /v1/assets/{id}`; only the fields the monitor reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatusResponse {
    pub status: String,
    #[serde(default)]
    pub percent_complete: Option<f64>,
}

/// Where a tiling job stands after one status read.
#[derive(Debug, Clone, PartialEq)]
pub enum TilingStatus {
    /// Queued or processing.
    InProgress { status: String, percent_complete: f64 },
    Complete { percent_complete: f64 },
    Failed { status: String },
}

impl TilingStatus {
    /// Any status mentioning `ERROR` is a failure, `COMPLETE` is success and
    /// everything else is still running.
    pub fn classify(status: &str, percent_complete: f64) -> Self {
        if status.contains("ERROR") {
            Self::Failed {
                status: status.to_string(),
            }
        } else if status == "COMPLETE" {
            Self::Complete { percent_complete }
        } else {
            Self::InProgress {
                status: status.to_string(),
                percent_complete,
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}

impl From<&AssetStatusResponse> for TilingStatus {
    fn from(response: &AssetStatusResponse) -> Self {
        Self::classify(&response.status, response.percent_complete.unwrap_or(0.0))
    }
}
