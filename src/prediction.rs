//! Prediction resource: creating runs, polling them to completion, and
//! consuming streamed output.

use std::fmt;

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use log::debug;
use reqwest::Method;
use serde_json::Value;
use time::OffsetDateTime;

use crate::api_types::{
    CreatePredictionRequest, ListPredictionsResponse, PredictionData, PredictionStatus,
};
use crate::client::ClientHandle;

/// Lazy sequence of output items from a streaming prediction. Finite once
/// the run completes; not restartable.
pub type OutputStream = BoxStream<'static, Result<Value>>;

/// A prediction reached the terminal `failed` state. Carries the error
/// detail the server reported, when it reported one.
#[derive(Debug)]
pub struct ModelError {
    pub detail: Option<String>,
}

impl ModelError {
    pub(crate) fn new(detail: Option<String>) -> Self {
        ModelError { detail }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "prediction failed: {}", detail),
            None => write!(f, "prediction failed"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Handle to one prediction. Public fields mirror the wire record; the
/// polling operations refresh them in place.
pub struct Prediction {
    pub id: String,
    pub version: String,
    pub status: PredictionStatus,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub logs: Option<String>,
    pub created_at: OffsetDateTime,
    pub started_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,

    handle: ClientHandle,
}

impl Prediction {
    pub(crate) fn from_data(data: PredictionData, handle: ClientHandle) -> Self {
        Prediction {
            id: data.id,
            version: data.version,
            status: data.status,
            input: data.input,
            output: data.output,
            error: data.error,
            logs: data.logs,
            created_at: data.created_at,
            started_at: data.started_at,
            completed_at: data.completed_at,
            handle,
        }
    }

    fn assign(&mut self, data: PredictionData) {
        self.id = data.id;
        self.version = data.version;
        self.status = data.status;
        self.input = data.input;
        self.output = data.output;
        self.error = data.error;
        self.logs = data.logs;
        self.created_at = data.created_at;
        self.started_at = data.started_at;
        self.completed_at = data.completed_at;
    }

    fn path(&self) -> String {
        format!("/v1/predictions/{}", self.id)
    }

    /// Refresh every field from the server.
    pub async fn reload(&mut self) -> Result<()> {
        let value = self
            .handle
            .transport
            .request(Method::GET, &self.path(), None)
            .await?;
        let data: PredictionData =
            serde_json::from_value(value).context("malformed prediction in response")?;
        self.assign(data);
        Ok(())
    }

    /// Poll until the prediction reaches a terminal state. Deadlines and
    /// cancellation are the caller's concern; this loops for as long as the
    /// server keeps reporting a non-terminal status.
    pub async fn wait(&mut self) -> Result<()> {
        while !self.status.is_terminal() {
            tokio::time::sleep(self.handle.poll_interval).await;
            self.reload().await?;
        }
        debug!("prediction {} finished with status {:?}", self.id, self.status);
        Ok(())
    }

    /// Ask the server to cancel the run, then refresh from its response.
    pub async fn cancel(&mut self) -> Result<()> {
        let value = self
            .handle
            .transport
            .request(Method::POST, &format!("{}/cancel", self.path()), None)
            .await?;
        let data: PredictionData =
            serde_json::from_value(value).context("malformed prediction in response")?;
        self.assign(data);
        Ok(())
    }

    /// Consume the prediction as a lazy stream of output-array elements,
    /// yielding each element as soon as the server reports it. Ends when the
    /// run completes; fails with [ModelError] if the terminal state is
    /// `failed`.
    pub fn output_iterator(self) -> OutputStream {
        let poll_interval = self.handle.poll_interval;
        stream::try_unfold((self, 0usize), move |(mut prediction, emitted)| async move {
            loop {
                let next = prediction
                    .output
                    .as_ref()
                    .and_then(Value::as_array)
                    .and_then(|items| items.get(emitted).cloned());
                if let Some(item) = next {
                    return Ok(Some((item, (prediction, emitted + 1))));
                }

                if prediction.status.is_terminal() {
                    if prediction.status == PredictionStatus::Failed {
                        return Err(anyhow::Error::new(ModelError::new(
                            prediction.error.clone(),
                        )));
                    }
                    return Ok(None);
                }

                tokio::time::sleep(poll_interval).await;
                prediction.reload().await?;
            }
        })
        .boxed()
    }
}

/// Namespace for prediction operations.
pub struct PredictionCollection {
    handle: ClientHandle,
}

impl PredictionCollection {
    pub(crate) fn new(handle: ClientHandle) -> Self {
        PredictionCollection { handle }
    }

    /// Create a prediction running the given version against the input.
    pub async fn create(&self, version_id: &str, input: Value) -> Result<Prediction> {
        let body = serde_json::to_value(CreatePredictionRequest {
            version: version_id.to_owned(),
            input,
        })?;
        let value = self
            .handle
            .transport
            .request(Method::POST, "/v1/predictions", Some(&body))
            .await?;
        let data: PredictionData =
            serde_json::from_value(value).context("malformed prediction in response")?;
        debug!("created prediction {} against version {}", data.id, version_id);
        Ok(Prediction::from_data(data, self.handle.clone()))
    }

    pub async fn get(&self, id: &str) -> Result<Prediction> {
        let value = self
            .handle
            .transport
            .request(Method::GET, &format!("/v1/predictions/{}", id), None)
            .await?;
        let data: PredictionData =
            serde_json::from_value(value).context("malformed prediction in response")?;
        Ok(Prediction::from_data(data, self.handle.clone()))
    }

    /// First page of the caller's predictions, newest first as the server
    /// orders them.
    pub async fn list(&self) -> Result<Vec<Prediction>> {
        let value = self
            .handle
            .transport
            .request(Method::GET, "/v1/predictions", None)
            .await?;
        let page: ListPredictionsResponse =
            serde_json::from_value(value).context("malformed prediction list in response")?;
        Ok(page
            .results
            .into_iter()
            .map(|data| Prediction::from_data(data, self.handle.clone()))
            .collect())
    }
}
