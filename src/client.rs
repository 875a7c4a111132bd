//! HTTP transport and the top-level [Client] facade.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::model::{ModelCollection, ModelRef};
use crate::prediction::PredictionCollection;
use crate::version::{self, PredictOutput, VersionCollection};

/// The single request primitive every resource goes through. Implemented by
/// [HttpTransport] for real traffic; tests swap in a canned implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and return the decoded JSON body. Non-2xx responses
    /// fail with [ApiError]; nothing is retried.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;
}

/// Error for a request the server answered with a non-2xx status.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,

    /// The `detail` field of the JSON error body, when the server sent one.
    pub detail: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "HTTP {}: {}", self.status, detail),
            None => write!(f, "HTTP {}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

/// reqwest-backed [Transport]. Owns the base URL and sends the configured
/// API token on every request.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Token {}", token))
                .context("api token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("model-client/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpTransport {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("detail").and_then(Value::as_str).map(str::to_owned));
            return Err(ApiError {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("failed to decode response from {} as JSON", url))
    }
}

/// Capabilities handed to every resource handle: the request primitive plus
/// the poll cadence for wait loops. Keeping this explicit (instead of handles
/// holding a whole client) keeps ownership and testability obvious.
#[derive(Clone)]
pub(crate) struct ClientHandle {
    pub transport: Arc<dyn Transport>,
    pub poll_interval: Duration,
}

/// Entry point for talking to the model-execution service.
pub struct Client {
    handle: ClientHandle,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let poll_interval = config.poll_interval();
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), poll_interval))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(transport: Arc<dyn Transport>, poll_interval: Duration) -> Self {
        Client {
            handle: ClientHandle {
                transport,
                poll_interval,
            },
        }
    }

    pub fn models(&self) -> ModelCollection {
        ModelCollection::new(self.handle.clone())
    }

    pub fn predictions(&self) -> PredictionCollection {
        PredictionCollection::new(self.handle.clone())
    }

    /// Run a model version identified as `owner/name:versionid` against the
    /// given input. Fetches the version, creates one prediction, and either
    /// returns the streamed output or waits for the terminal state, exactly
    /// like `Version::predict` minus the deprecation.
    pub async fn run(&self, identifier: &str, input: Value) -> Result<PredictOutput> {
        let (model, version_id) = parse_identifier(identifier)?;
        let version = VersionCollection::new(self.handle.clone(), model)
            .get(&version_id)
            .await?;
        version::run_version(&version, input).await
    }
}

static RUN_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_][A-Za-z0-9_.-]*)/([A-Za-z0-9_][A-Za-z0-9_.-]*):([A-Za-z0-9]+)$")
        .unwrap()
});

fn parse_identifier(identifier: &str) -> Result<(ModelRef, String)> {
    let captures = RUN_IDENTIFIER.captures(identifier).with_context(|| {
        format!(
            "invalid identifier {:?}, expected owner/name:versionid",
            identifier
        )
    })?;

    Ok((
        ModelRef {
            owner: captures[1].to_owned(),
            name: captures[2].to_owned(),
        },
        captures[3].to_owned(),
    ))
}
