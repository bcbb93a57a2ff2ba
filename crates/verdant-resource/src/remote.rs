//! Resource implementation backed by a remote entity service.
//!
//! The wire stubs themselves are generated elsewhere; this module only
//! needs their shape: each operation either returns a structured envelope or
//! a transport-level [`tonic::Status`]. Transport errors are classified
//! exactly once, through the status translator.

use async_trait::async_trait;
use tonic::Status;

use verdant_types::{Entity, Outcome, ResourceResult, VersionTag};

use crate::status::outcome_from_transport;
use crate::{ReadOptions, Resource, ResourceResponse, WriteOptions};

/// What a remote entity service returns on a structurally successful call.
///
/// A missing payload inside a successful `get` reply is a representable
/// "no such entity" case, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEnvelope<T> {
    pub payload: Option<T>,
    pub version: Option<VersionTag>,
}

impl<T> RemoteEnvelope<T> {
    pub fn new(payload: Option<T>, version: Option<VersionTag>) -> Self {
        Self { payload, version }
    }

    pub fn empty() -> Self {
        Self { payload: None, version: None }
    }
}

/// Client side of a remote entity service, one per entity type.
///
/// Implementations wrap the generated service stubs; retry and timeout
/// policy live in the transport client, never here.
#[async_trait]
pub trait RemoteEntityClient<V: Entity>: Send + Sync {
    async fn get(&self, key: &str) -> Result<RemoteEnvelope<V>, Status>;
    async fn create(&self, value: &V) -> Result<RemoteEnvelope<()>, Status>;
    async fn update(&self, value: &V, upsert: bool) -> Result<RemoteEnvelope<()>, Status>;
    async fn delete(&self, key: &str) -> Result<RemoteEnvelope<()>, Status>;
}

/// Remote-proxy implementation of the resource contract.
///
/// Client side of the deployment: delegates every operation to the remote
/// service, which holds the document resource next to storage.
pub struct RemoteResource<C> {
    client: C,
}

impl<C> RemoteResource<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

fn classify(status: &Status) -> Outcome {
    let outcome = outcome_from_transport(status.code());
    if outcome == Outcome::Internal {
        tracing::warn!(code = ?status.code(), message = status.message(), "remote call failed");
    }
    outcome
}

#[async_trait]
impl<V, C> Resource<V> for RemoteResource<C>
where
    V: Entity,
    C: RemoteEntityClient<V>,
{
    async fn get(&self, key: &str, _opts: ReadOptions) -> ResourceResult<ResourceResponse<V>> {
        match self.client.get(key).await {
            Ok(envelope) => match envelope.payload {
                Some(value) => Ok(ResourceResponse::ok(value, envelope.version)),
                None => Ok(ResourceResponse::not_found()),
            },
            Err(status) => Ok(ResourceResponse::of(classify(&status), None)),
        }
    }

    async fn create(&self, value: &V) -> ResourceResult<ResourceResponse<()>> {
        match self.client.create(value).await {
            Ok(envelope) => Ok(ResourceResponse::write_ok(envelope.version)),
            Err(status) => Ok(ResourceResponse::of(classify(&status), None)),
        }
    }

    async fn update(&self, value: &V, opts: WriteOptions) -> ResourceResult<ResourceResponse<()>> {
        match self.client.update(value, opts.upsert).await {
            Ok(envelope) => Ok(ResourceResponse::write_ok(envelope.version)),
            Err(status) => Ok(ResourceResponse::of(classify(&status), None)),
        }
    }

    async fn delete(&self, key: &str) -> ResourceResult<ResourceResponse<()>> {
        match self.client.delete(key).await {
            Ok(envelope) => Ok(ResourceResponse::write_ok(envelope.version)),
            Err(status) => Ok(ResourceResponse::of(classify(&status), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;
    use verdant_types::Gardener;

    fn gardener(id: &str) -> Gardener {
        Gardener {
            id: id.to_string(),
            account_id: "acct:1".to_string(),
            name: "Alice".to_string(),
        }
    }

    /// Canned client returning fixed replies per operation.
    struct CannedClient {
        get_reply: Result<RemoteEnvelope<Gardener>, Code>,
        write_reply: Result<RemoteEnvelope<()>, Code>,
    }

    impl CannedClient {
        fn replying_get(reply: Result<RemoteEnvelope<Gardener>, Code>) -> Self {
            Self { get_reply: reply, write_reply: Ok(RemoteEnvelope::empty()) }
        }

        fn replying_write(reply: Result<RemoteEnvelope<()>, Code>) -> Self {
            Self { get_reply: Ok(RemoteEnvelope::empty()), write_reply: reply }
        }
    }

    #[async_trait]
    impl RemoteEntityClient<Gardener> for CannedClient {
        async fn get(&self, _key: &str) -> Result<RemoteEnvelope<Gardener>, Status> {
            self.get_reply.clone().map_err(|code| Status::new(code, "canned"))
        }

        async fn create(&self, _value: &Gardener) -> Result<RemoteEnvelope<()>, Status> {
            self.write_reply.clone().map_err(|code| Status::new(code, "canned"))
        }

        async fn update(
            &self,
            _value: &Gardener,
            _upsert: bool,
        ) -> Result<RemoteEnvelope<()>, Status> {
            self.write_reply.clone().map_err(|code| Status::new(code, "canned"))
        }

        async fn delete(&self, _key: &str) -> Result<RemoteEnvelope<()>, Status> {
            self.write_reply.clone().map_err(|code| Status::new(code, "canned"))
        }
    }

    #[tokio::test]
    async fn transport_success_with_payload_is_ok() {
        let value = gardener("gardener:1");
        let client = CannedClient::replying_get(Ok(RemoteEnvelope::new(
            Some(value.clone()),
            Some(VersionTag::new("v7")),
        )));
        let resource = RemoteResource::new(client);

        let resp = resource.get("gardener:1", ReadOptions::default()).await.unwrap();
        assert_eq!(resp.outcome, Outcome::Ok);
        assert_eq!(resp.payload, Some(value));
        assert_eq!(resp.metadata, Some(VersionTag::new("v7")));
    }

    #[tokio::test]
    async fn empty_payload_in_successful_reply_is_not_found() {
        let client = CannedClient::replying_get(Ok(RemoteEnvelope::empty()));
        let resource = RemoteResource::new(client);

        let resp = resource.get("gardener:1", ReadOptions::default()).await.unwrap();
        assert_eq!(resp.outcome, Outcome::NotFound);
        assert!(resp.payload.is_none());
    }

    #[tokio::test]
    async fn transport_not_found_maps_to_not_found() {
        let client = CannedClient::replying_get(Err(Code::NotFound));
        let resource = RemoteResource::new(client);

        let resp = resource.get("gardener:1", ReadOptions::default()).await.unwrap();
        assert_eq!(resp.outcome, Outcome::NotFound);
    }

    #[tokio::test]
    async fn transport_unavailable_maps_to_internal() {
        let client = CannedClient::replying_get(Err(Code::Unavailable));
        let resource = RemoteResource::new(client);

        let resp = resource.get("gardener:1", ReadOptions::default()).await.unwrap();
        assert_eq!(resp.outcome, Outcome::Internal);
    }

    #[tokio::test]
    async fn write_success_carries_version() {
        let client = CannedClient::replying_write(Ok(RemoteEnvelope::new(
            None,
            Some(VersionTag::new("v9")),
        )));
        let resource = RemoteResource::new(client);

        let resp = resource.create(&gardener("gardener:1")).await.unwrap();
        assert_eq!(resp.outcome, Outcome::Ok);
        assert_eq!(resp.metadata, Some(VersionTag::new("v9")));

        let resp = resource
            .update(&gardener("gardener:1"), WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(resp.outcome, Outcome::Ok);
    }

    #[tokio::test]
    async fn delete_failure_is_classified_once() {
        let client = CannedClient::replying_write(Err(Code::DeadlineExceeded));
        let resource = RemoteResource::new(client);

        let resp = resource.delete("gardener:1").await.unwrap();
        assert_eq!(resp.outcome, Outcome::Internal);
    }
}
