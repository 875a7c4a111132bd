//! Version resource: the immutable deployed builds of a model, plus the
//! deprecated convenience path for running one directly.

use anyhow::{Context, Result};
use log::warn;
use reqwest::Method;
use serde_json::Value;
use time::OffsetDateTime;

use crate::api_types::{ListVersionsResponse, ModelVersion, PredictionStatus};
use crate::client::ClientHandle;
use crate::model::ModelRef;
use crate::prediction::{ModelError, OutputStream, PredictionCollection};
use crate::schema::{make_schema_backwards_compatible, output_is_iterator};

/// What a prediction run produced: either the final output value, or a lazy
/// stream of output items for models whose schema declares an iterator-typed
/// output.
pub enum PredictOutput {
    Done(Option<Value>),
    Stream(OutputStream),
}

impl std::fmt::Debug for PredictOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictOutput::Done(value) => f.debug_tuple("Done").field(value).finish(),
            PredictOutput::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

/// Handle to one version of a model. Only ever constructed from a server
/// response; the public fields mirror the wire record.
pub struct Version {
    /// The unique ID of the version.
    pub id: String,

    /// When the version was created.
    pub created_at: OffsetDateTime,

    /// The version of the build tool that produced this version.
    pub cog_version: String,

    /// An OpenAPI description of the model inputs and outputs, exactly as
    /// the server sent it. Normalized copies are made where needed; the
    /// stored schema stays raw.
    pub openapi_schema: Value,

    handle: ClientHandle,
    model: ModelRef,
}

impl Version {
    pub(crate) fn from_record(record: ModelVersion, handle: ClientHandle, model: ModelRef) -> Self {
        Version {
            id: record.id,
            created_at: record.created_at,
            cog_version: record.cog_version,
            openapi_schema: record.openapi_schema,
            handle,
            model,
        }
    }

    fn collection(&self) -> VersionCollection {
        VersionCollection::new(self.handle.clone(), self.model.clone())
    }

    /// Create a prediction against this version and return its output.
    ///
    /// For iterator-typed outputs the returned stream is lazy: it yields
    /// items as the remote run produces them and is not restartable. For
    /// everything else this waits for the terminal state and fails with
    /// [ModelError] if the run failed. Every call creates one new remote
    /// prediction.
    #[deprecated(note = "use Client::run instead")]
    pub async fn predict(&self, input: Value) -> Result<PredictOutput> {
        warn!("Version::predict is deprecated and will be removed; use Client::run instead");
        run_version(self, input).await
    }

    /// Re-fetch this version by id and overwrite every field on the current
    /// handle. The update is field-by-field and not atomic; callers must not
    /// read concurrently with a reload.
    pub async fn reload(&mut self) -> Result<()> {
        let fresh = self.collection().get(&self.id).await?;
        self.id = fresh.id;
        self.created_at = fresh.created_at;
        self.cog_version = fresh.cog_version;
        self.openapi_schema = fresh.openapi_schema;
        Ok(())
    }
}

/// Shared run flow behind both `Version::predict` and `Client::run`.
pub(crate) async fn run_version(version: &Version, input: Value) -> Result<PredictOutput> {
    let mut prediction = PredictionCollection::new(version.handle.clone())
        .create(&version.id, input)
        .await?;

    let schema =
        make_schema_backwards_compatible(version.openapi_schema.clone(), &version.cog_version);
    if output_is_iterator(&schema) {
        return Ok(PredictOutput::Stream(prediction.output_iterator()));
    }

    prediction.wait().await?;
    if prediction.status == PredictionStatus::Failed {
        return Err(ModelError::new(prediction.error.clone()).into());
    }
    Ok(PredictOutput::Done(prediction.output))
}

/// Namespace for operations on one model's versions. Stateless beyond the
/// model binding: every call is a single request/parse/construct cycle.
pub struct VersionCollection {
    handle: ClientHandle,
    model: ModelRef,
}

impl VersionCollection {
    pub(crate) fn new(handle: ClientHandle, model: ModelRef) -> Self {
        VersionCollection { handle, model }
    }

    /// Get a specific model version by ID.
    pub async fn get(&self, id: &str) -> Result<Version> {
        let value = self
            .handle
            .transport
            .request(Method::GET, &self.model.version_path(id), None)
            .await?;
        let record: ModelVersion =
            serde_json::from_value(value).context("malformed version in response")?;
        Ok(Version::from_record(
            record,
            self.handle.clone(),
            self.model.clone(),
        ))
    }

    /// List all versions of the model, in the order the server returns them.
    pub async fn list(&self) -> Result<Vec<Version>> {
        let value = self
            .handle
            .transport
            .request(Method::GET, &self.model.versions_path(), None)
            .await?;
        let page: ListVersionsResponse =
            serde_json::from_value(value).context("malformed version list in response")?;
        Ok(page
            .results
            .into_iter()
            .map(|record| Version::from_record(record, self.handle.clone(), self.model.clone()))
            .collect())
    }
}
