//! Types mirroring the wire format of the model-execution API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A specific version of a hosted model. Versions are immutable server-side;
/// every instance of this record comes from deserializing a server response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelVersion {
    /// The unique ID of the version, assigned by the server.
    pub id: String,

    /// When the version was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// The version of the build tool that produced this version.
    pub cog_version: String,

    /// An OpenAPI description of the model inputs and outputs.
    pub openapi_schema: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListVersionsResponse {
    pub results: Vec<ModelVersion>,
}

/// A model registered on the hosting service, identified by owner and name.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisteredModel {
    pub owner: String,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub visibility: Option<String>,

    #[serde(default)]
    pub latest_version: Option<ModelVersion>,
}

/// Status of a prediction. A prediction starts in [Starting], moves to
/// [Processing] once a worker picks it up, and ends in exactly one of
/// [Succeeded], [Failed], or [Canceled].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    #[serde(rename = "starting")]
    Starting,

    #[serde(rename = "processing")]
    Processing,

    #[serde(rename = "succeeded")]
    Succeeded,

    #[serde(rename = "failed")]
    Failed,

    #[serde(rename = "canceled")]
    Canceled,
}

impl PredictionStatus {
    /// Whether the prediction has finished, one way or another.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// One run of a model version against a given input.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PredictionData {
    pub id: String,

    /// ID of the model version the prediction runs against.
    pub version: String,

    pub status: PredictionStatus,

    #[serde(default)]
    pub input: Option<Value>,

    /// Final output for completed predictions. For streaming models this is
    /// a growing array that gains elements while the prediction runs.
    #[serde(default)]
    pub output: Option<Value>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub logs: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListPredictionsResponse {
    pub results: Vec<PredictionData>,

    /// Opaque cursor URL for the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreatePredictionRequest {
    pub version: String,
    pub input: Value,
}
