//! Async client for a hosted model-execution service.
//!
//! The service hosts models; each model has immutable versions, and a
//! version is run by creating a prediction against it. This crate is a thin
//! typed binding over the HTTP API: it issues requests, deserializes JSON
//! into records, and hands back resource handles ([Model], [Version],
//! [Prediction]) that know how to refresh themselves and kick off runs.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use model_client::{Client, PredictOutput};
//! use serde_json::json;
//!
//! let client = Client::from_env()?;
//! let output = client
//!     .run("acme/text-gen:abc123", json!({"prompt": "hello"}))
//!     .await?;
//! if let PredictOutput::Done(value) = output {
//!     println!("{:?}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api_types;
pub mod client;
pub mod config;
pub mod model;
pub mod prediction;
pub mod schema;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;

pub use api_types::{ModelVersion, PredictionStatus};
pub use client::{ApiError, Client, HttpTransport, Transport};
pub use config::ClientConfig;
pub use model::{Model, ModelCollection, ModelRef};
pub use prediction::{ModelError, OutputStream, Prediction, PredictionCollection};
pub use version::{PredictOutput, Version, VersionCollection};
