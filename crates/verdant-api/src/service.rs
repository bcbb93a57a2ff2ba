//! Generic entity service handlers.
//!
//! One `EntityService<V>` per entity type is all a CRUD endpoint needs; the
//! services differ only in `V`. Handlers apply the status-to-wire contract:
//! `OK` carries the payload, `NOT_FOUND` becomes a missing-resource wire
//! error, `INTERNAL_ERROR` becomes a generic failure. Integrity violations
//! and contract violations are logged, then surfaced as `internal` and
//! `invalid_argument` respectively.

use std::sync::Arc;

use tonic::Status;

use verdant_resource::{
    EntityLoader, ReadOptions, Resource, ResourceResponse, WriteOptions,
};
use verdant_types::{Entity, Outcome, ResourceError, VersionTag};

/// Wire reply for a successful get.
#[derive(Debug, Clone, PartialEq)]
pub struct GetReply<V> {
    pub value: V,
    pub version: Option<String>,
}

/// Wire reply for a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReply {
    pub version: Option<String>,
}

/// Translate a non-OK outcome into its wire error.
pub fn status_for_outcome(outcome: Outcome, what: &str) -> Status {
    match outcome {
        Outcome::Ok => Status::ok(""),
        Outcome::NotFound => Status::not_found(format!("{} not found", what)),
        Outcome::Internal => Status::internal(format!("{} operation failed", what)),
    }
}

fn status_for_error(err: ResourceError) -> Status {
    match err {
        ResourceError::Contract(msg) => {
            tracing::warn!(error = msg, "caller violated the resource contract");
            Status::invalid_argument(msg)
        }
        ResourceError::Integrity(msg) => {
            tracing::error!(error = %msg, "backend integrity violation");
            Status::internal("backend state is inconsistent")
        }
        other => {
            tracing::error!(error = %other, "resource operation failed");
            Status::internal("operation failed")
        }
    }
}

fn version_string(tag: Option<VersionTag>) -> Option<String> {
    tag.map(|t| t.0)
}

/// The uniform CRUD surface over one entity type.
pub struct EntityService<V: Entity> {
    resource: Arc<dyn Resource<V>>,
}

impl<V: Entity> EntityService<V> {
    pub fn new(resource: Arc<dyn Resource<V>>) -> Self {
        Self { resource }
    }

    /// Build a batch loader scoped to one inbound request.
    ///
    /// Callers create one per request and drop it with the request; the
    /// loader must never be shared across requests.
    pub fn request_loader(
        &self,
        on_missing: impl Fn(&str) -> V + Send + Sync + 'static,
    ) -> EntityLoader<V> {
        EntityLoader::new(Arc::clone(&self.resource), on_missing)
    }

    pub async fn get(&self, key: &str) -> Result<GetReply<V>, Status> {
        let resp = self
            .resource
            .get(key, ReadOptions::default())
            .await
            .map_err(status_for_error)?;

        match resp.outcome {
            Outcome::Ok => {
                let value = resp
                    .payload
                    .ok_or_else(|| Status::internal("read succeeded without a payload"))?;
                Ok(GetReply { value, version: version_string(resp.metadata) })
            }
            outcome => Err(status_for_outcome(outcome, V::container())),
        }
    }

    pub async fn create(&self, value: V) -> Result<WriteReply, Status> {
        let resp = self.resource.create(&value).await.map_err(status_for_error)?;
        into_write_reply(resp, V::container())
    }

    pub async fn update(&self, value: V, upsert: bool) -> Result<WriteReply, Status> {
        let opts = WriteOptions { upsert, ..WriteOptions::default() };
        let resp = self.resource.update(&value, opts).await.map_err(status_for_error)?;
        into_write_reply(resp, V::container())
    }

    pub async fn delete(&self, key: &str) -> Result<WriteReply, Status> {
        let resp = self.resource.delete(key).await.map_err(status_for_error)?;
        into_write_reply(resp, V::container())
    }
}

/// The full set of entity services a server exposes, all backed by the
/// same document store.
pub struct Services {
    pub accounts: EntityService<verdant_types::Account>,
    pub gardens: EntityService<verdant_types::Garden>,
    pub gardeners: EntityService<verdant_types::Gardener>,
    pub plants: EntityService<verdant_types::Plant>,
    pub events: EntityService<verdant_types::GardenEvent>,
}

impl Services {
    pub fn over_store(store: Arc<dyn verdant_store::DocumentStore>) -> Self {
        fn service<V: Entity>(store: &Arc<dyn verdant_store::DocumentStore>) -> EntityService<V> {
            EntityService::new(Arc::new(verdant_resource::DocumentResource::new(Arc::clone(
                store,
            ))))
        }

        Self {
            accounts: service(&store),
            gardens: service(&store),
            gardeners: service(&store),
            plants: service(&store),
            events: service(&store),
        }
    }
}

fn into_write_reply(resp: ResourceResponse<()>, what: &str) -> Result<WriteReply, Status> {
    match resp.outcome {
        Outcome::Ok => Ok(WriteReply { version: version_string(resp.metadata) }),
        outcome => Err(status_for_outcome(outcome, what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;
    use verdant_resource::DocumentResource;
    use verdant_store::{DocumentStore, MemoryStore};
    use verdant_types::Garden;

    fn garden(id: &str) -> Garden {
        Garden {
            id: id.to_string(),
            account_id: "acct:1".to_string(),
            name: "Back plot".to_string(),
            hardiness_zone: 7,
            public: true,
        }
    }

    fn service() -> EntityService<Garden> {
        let store = Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>;
        EntityService::new(Arc::new(DocumentResource::new(store)))
    }

    #[test]
    fn outcome_to_wire_mapping() {
        assert_eq!(status_for_outcome(Outcome::Ok, "gardens").code(), Code::Ok);
        assert_eq!(status_for_outcome(Outcome::NotFound, "gardens").code(), Code::NotFound);
        assert_eq!(status_for_outcome(Outcome::Internal, "gardens").code(), Code::Internal);
    }

    #[tokio::test]
    async fn create_then_get_over_the_service() {
        let service = service();
        let value = garden("garden:1");

        let write = service.create(value.clone()).await.unwrap();
        assert!(write.version.is_some());

        let reply = service.get("garden:1").await.unwrap();
        assert_eq!(reply.value, value);
        assert_eq!(reply.version, write.version);
    }

    #[tokio::test]
    async fn get_missing_is_wire_not_found() {
        let service = service();
        let status = service.get("garden:ghost").await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.message().contains("gardens"));
    }

    #[tokio::test]
    async fn duplicate_create_is_wire_internal() {
        let service = service();
        service.create(garden("garden:1")).await.unwrap();

        let status = service.create(garden("garden:1")).await.unwrap_err();
        assert_eq!(status.code(), Code::Internal);
    }

    #[tokio::test]
    async fn non_upsert_update_is_invalid_argument() {
        let service = service();
        let status = service.update(garden("garden:1"), false).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn delete_then_delete_again() {
        let service = service();
        service.create(garden("garden:1")).await.unwrap();

        service.delete("garden:1").await.unwrap();
        let status = service.delete("garden:1").await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn request_loader_resolves_through_the_service_resource() {
        let service = service();
        service.create(garden("garden:1")).await.unwrap();

        let loader = service.request_loader(|key| Garden {
            id: key.to_string(),
            account_id: String::new(),
            name: String::new(),
            hardiness_zone: 0,
            public: false,
        });

        let found = loader.load("garden:1");
        let missing = loader.load("garden:ghost");
        loader.dispatch().await;

        assert_eq!(found.resolve().await.unwrap(), garden("garden:1"));
        assert_eq!(missing.resolve().await.unwrap().name, "");
    }
}
