//! Shared fixtures for the crate's tests: a canned transport and handle
//! builders, so nothing here ever opens a socket.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::client::{Client, ClientHandle, Transport};
use crate::model::ModelRef;
use crate::prediction::PredictionCollection;
use crate::version::VersionCollection;

/// Transport that replays canned responses keyed by `"METHOD path"`.
/// Multiple responses for the same key are consumed in order; the last one
/// keeps repeating so reload loops always have something to read.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeTransport::default())
    }

    pub fn respond(&self, method: &str, path: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(&self, method: Method, path: &str, _body: Option<&Value>) -> Result<Value> {
        let key = format!("{} {}", method, path);
        self.calls.lock().unwrap().push(key.clone());

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&key)
            .with_context(|| format!("no canned response for {}", key))?;
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            queue
                .front()
                .cloned()
                .with_context(|| format!("no canned response for {}", key))
        }
    }
}

pub fn handle_for(transport: &Arc<FakeTransport>) -> ClientHandle {
    ClientHandle {
        transport: transport.clone(),
        // Keep poll loops fast; the fake never makes anyone actually wait.
        poll_interval: Duration::from_millis(1),
    }
}

pub fn client_with(transport: &Arc<FakeTransport>) -> Client {
    Client::with_transport(transport.clone(), Duration::from_millis(1))
}

/// Version collection bound to the `acme/text-gen` model used across tests.
pub fn versions_for(transport: &Arc<FakeTransport>) -> VersionCollection {
    VersionCollection::new(
        handle_for(transport),
        ModelRef {
            owner: "acme".to_owned(),
            name: "text-gen".to_owned(),
        },
    )
}

pub fn predictions_for(transport: &Arc<FakeTransport>) -> PredictionCollection {
    PredictionCollection::new(handle_for(transport))
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
