//! Resource implementation backed directly by the document store.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use verdant_store::{reply, DocumentStore};
use verdant_types::{Entity, Outcome, ResourceError, ResourceResult};

use crate::status::outcome_from_store;
use crate::template::Template;
use crate::{ReadOptions, Resource, ResourceResponse, WriteOptions};

/// What to do with a concurrency token supplied on a write.
///
/// The token is modeled in the data either way; `Enforce` additionally
/// compares it against the stored document's current tag before an upsert
/// and fails the write when stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionPolicy {
    /// Accept the token without validating it
    #[default]
    Ignore,
    /// Reject upserts whose token no longer matches the stored document
    Enforce,
}

/// Direct document-store implementation of the resource contract.
///
/// Server side this is the resource closest to storage; remote proxies
/// ultimately land here.
pub struct DocumentResource<V: Entity> {
    store: Arc<dyn DocumentStore>,
    precondition: PreconditionPolicy,
    _entity: PhantomData<fn() -> V>,
}

impl<V: Entity> DocumentResource<V> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, precondition: PreconditionPolicy::default(), _entity: PhantomData }
    }

    pub fn with_precondition(store: Arc<dyn DocumentStore>, policy: PreconditionPolicy) -> Self {
        Self { store, precondition: policy, _entity: PhantomData }
    }

    /// Whether an upsert guarded by `if_match` may proceed.
    async fn precondition_holds(&self, key: &str, opts: &WriteOptions) -> ResourceResult<bool> {
        let supplied = match (&self.precondition, &opts.if_match) {
            (PreconditionPolicy::Ignore, _) | (_, None) => return Ok(true),
            (PreconditionPolicy::Enforce, Some(tag)) => tag,
        };

        let query = Template::key_only(V::key_field(), key).compile(V::container())?;
        let documents = self.store.query(&query).await?;
        let current = match documents.as_slice() {
            [] => return Ok(true), // nothing stored yet; the upsert creates
            [doc] => &doc.version,
            _ => {
                return Err(ResourceError::Integrity(format!(
                    "key {} resolved to {} documents in {}",
                    key,
                    documents.len(),
                    V::container()
                )))
            }
        };
        Ok(current == supplied)
    }
}

#[async_trait]
impl<V: Entity> Resource<V> for DocumentResource<V> {
    async fn get(&self, key: &str, _opts: ReadOptions) -> ResourceResult<ResourceResponse<V>> {
        let query = Template::key_only(V::key_field(), key).compile(V::container())?;
        tracing::debug!(container = V::container(), key, "document get");

        let mut documents = self.store.query(&query).await?;
        match documents.len() {
            0 => Ok(ResourceResponse::not_found()),
            1 => {
                let document = documents.remove(0);
                let value: V = serde_json::from_value(document.body)?;
                Ok(ResourceResponse::ok(value, Some(document.version)))
            }
            n => {
                // The key space is contractually unique; more than one match
                // means corrupted backend state. Abort loudly.
                tracing::error!(
                    container = V::container(),
                    key,
                    matches = n,
                    "integrity violation: unique key matched multiple documents"
                );
                Err(ResourceError::Integrity(format!(
                    "key {} resolved to {} documents in {}",
                    key,
                    n,
                    V::container()
                )))
            }
        }
    }

    async fn create(&self, value: &V) -> ResourceResult<ResourceResponse<()>> {
        let body = serde_json::to_value(value)?;
        let reply = self.store.insert(V::container(), value.key(), body).await?;

        // Only the store's "created" reply is success for an insert.
        let outcome =
            if reply.code == reply::CREATED { Outcome::Ok } else { Outcome::Internal };
        tracing::debug!(container = V::container(), key = value.key(), code = reply.code, "document create");
        Ok(ResourceResponse::of(outcome, reply.version))
    }

    async fn update(&self, value: &V, opts: WriteOptions) -> ResourceResult<ResourceResponse<()>> {
        if !opts.upsert {
            // Full-replace upsert is the only supported write mode; asking
            // for anything else is a caller bug, not a runtime outcome.
            return Err(ResourceError::Contract(
                "update without upsert is not supported by the document resource",
            ));
        }

        if !self.precondition_holds(value.key(), &opts).await? {
            tracing::debug!(
                container = V::container(),
                key = value.key(),
                "stale concurrency token; rejecting upsert"
            );
            return Ok(ResourceResponse::internal());
        }

        let body = serde_json::to_value(value)?;
        let reply = self.store.upsert(V::container(), value.key(), body).await?;

        // "Replaced" is the expected success; an upsert that had to create
        // is a success as well.
        let outcome = match reply.code {
            reply::REPLACED | reply::CREATED => Outcome::Ok,
            _ => Outcome::Internal,
        };
        tracing::debug!(container = V::container(), key = value.key(), code = reply.code, "document update");
        Ok(ResourceResponse::of(outcome, reply.version))
    }

    async fn delete(&self, key: &str) -> ResourceResult<ResourceResponse<()>> {
        let reply = self.store.remove(V::container(), key).await?;
        tracing::debug!(container = V::container(), key, code = reply.code, "document delete");
        Ok(ResourceResponse::of(outcome_from_store(reply.code), reply.version))
    }
}
