//! Model resource: lookup by owner/name and the binding that scopes a
//! version collection.

use anyhow::{Context, Result};
use reqwest::Method;

use crate::api_types::RegisteredModel;
use crate::client::ClientHandle;
use crate::version::VersionCollection;

/// Identifies one model on the service. Collections hold this binding for
/// their whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub owner: String,
    pub name: String,
}

impl ModelRef {
    pub(crate) fn path(&self) -> String {
        format!("/v1/models/{}/{}", self.owner, self.name)
    }

    pub(crate) fn versions_path(&self) -> String {
        format!("{}/versions", self.path())
    }

    pub(crate) fn version_path(&self, id: &str) -> String {
        format!("{}/{}", self.versions_path(), id)
    }
}

/// Handle to a model registered on the service.
pub struct Model {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Option<String>,

    handle: ClientHandle,
}

impl Model {
    pub(crate) fn from_record(record: RegisteredModel, handle: ClientHandle) -> Self {
        Model {
            owner: record.owner,
            name: record.name,
            description: record.description,
            visibility: record.visibility,
            handle,
        }
    }

    fn model_ref(&self) -> ModelRef {
        ModelRef {
            owner: self.owner.clone(),
            name: self.name.clone(),
        }
    }

    /// Namespace for this model's versions.
    pub fn versions(&self) -> VersionCollection {
        VersionCollection::new(self.handle.clone(), self.model_ref())
    }

    /// Refresh every field from the server, keeping this handle alive for
    /// anyone holding a reference to it.
    pub async fn reload(&mut self) -> Result<()> {
        let fresh = ModelCollection::new(self.handle.clone())
            .get(&self.owner, &self.name)
            .await?;
        self.owner = fresh.owner;
        self.name = fresh.name;
        self.description = fresh.description;
        self.visibility = fresh.visibility;
        Ok(())
    }
}

/// Namespace for model lookup.
pub struct ModelCollection {
    handle: ClientHandle,
}

impl ModelCollection {
    pub(crate) fn new(handle: ClientHandle) -> Self {
        ModelCollection { handle }
    }

    pub async fn get(&self, owner: &str, name: &str) -> Result<Model> {
        let model_ref = ModelRef {
            owner: owner.to_owned(),
            name: name.to_owned(),
        };
        let value = self
            .handle
            .transport
            .request(Method::GET, &model_ref.path(), None)
            .await?;
        let record: RegisteredModel =
            serde_json::from_value(value).context("malformed model in response")?;
        Ok(Model::from_record(record, self.handle.clone()))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::ModelRef;
    use crate::test_support::{client_with, FakeTransport};

    #[test]
    pub fn model_paths() {
        let model = ModelRef {
            owner: "acme".to_owned(),
            name: "text-gen".to_owned(),
        };
        assert_eq!(model.path(), "/v1/models/acme/text-gen");
        assert_eq!(model.versions_path(), "/v1/models/acme/text-gen/versions");
        assert_eq!(
            model.version_path("abc123"),
            "/v1/models/acme/text-gen/versions/abc123"
        );
    }

    #[tokio::test]
    pub async fn get_model() {
        let transport = FakeTransport::new();
        transport.respond(
            "GET",
            "/v1/models/acme/text-gen",
            json!({
                "owner": "acme",
                "name": "text-gen",
                "description": "a text generator",
                "visibility": "public"
            }),
        );

        let client = client_with(&transport);
        let model = client.models().get("acme", "text-gen").await.unwrap();
        assert_eq!(model.owner, "acme");
        assert_eq!(model.name, "text-gen");
        assert_eq!(model.description.as_deref(), Some("a text generator"));
        assert_eq!(model.visibility.as_deref(), Some("public"));
    }

    #[tokio::test]
    pub async fn versions_collection_is_bound_to_the_model() {
        let transport = FakeTransport::new();
        transport.respond(
            "GET",
            "/v1/models/acme/text-gen",
            json!({"owner": "acme", "name": "text-gen"}),
        );
        transport.respond(
            "GET",
            "/v1/models/acme/text-gen/versions",
            json!({"results": []}),
        );

        let client = client_with(&transport);
        let model = client.models().get("acme", "text-gen").await.unwrap();
        let versions = model.versions().list().await.unwrap();
        assert!(versions.is_empty());
        assert_eq!(
            transport.calls(),
            vec![
                "GET /v1/models/acme/text-gen",
                "GET /v1/models/acme/text-gen/versions"
            ]
        );
    }
}
