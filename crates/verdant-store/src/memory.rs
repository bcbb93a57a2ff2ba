//! In-memory document store for testing and development

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use verdant_types::{StoreResult, VersionTag};

use crate::{reply, Document, DocumentStore, FilterQuery, WriteReply};

/// In-memory document store implementation.
///
/// Containers are created on first write. Version tags are drawn from a
/// store-wide counter, so every successful write observes a tag no earlier
/// write has produced.
pub struct MemoryStore {
    containers: Arc<RwLock<HashMap<String, HashMap<String, Document>>>>,
    next_version: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            containers: Arc::new(RwLock::new(HashMap::new())),
            next_version: AtomicU64::new(1),
        }
    }

    fn mint_version(&self) -> VersionTag {
        let n = self.next_version.fetch_add(1, Ordering::Relaxed);
        VersionTag::new(format!("{:016x}", n))
    }

    /// Number of documents currently held in `container`
    pub async fn len(&self, container: &str) -> usize {
        let containers = self.containers.read().await;
        containers.get(container).map(|c| c.len()).unwrap_or(0)
    }

    pub async fn is_empty(&self, container: &str) -> bool {
        self.len(container).await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, query: &FilterQuery) -> StoreResult<Vec<Document>> {
        let containers = self.containers.read().await;
        let matches = containers
            .get(query.container())
            .map(|container| {
                container
                    .values()
                    .filter(|doc| query.matches(&doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }

    async fn insert(&self, container: &str, key: &str, body: Value) -> StoreResult<WriteReply> {
        let mut containers = self.containers.write().await;
        let entries = containers.entry(container.to_string()).or_default();

        if entries.contains_key(key) {
            return Ok(WriteReply::code_only(reply::CONFLICT));
        }

        let version = self.mint_version();
        entries.insert(key.to_string(), Document { body, version: version.clone() });
        tracing::debug!(container, key, "document inserted");
        Ok(WriteReply::new(reply::CREATED, Some(version)))
    }

    async fn upsert(&self, container: &str, key: &str, body: Value) -> StoreResult<WriteReply> {
        let mut containers = self.containers.write().await;
        let entries = containers.entry(container.to_string()).or_default();

        let code = if entries.contains_key(key) { reply::REPLACED } else { reply::CREATED };
        let version = self.mint_version();
        entries.insert(key.to_string(), Document { body, version: version.clone() });
        tracing::debug!(container, key, code, "document upserted");
        Ok(WriteReply::new(code, Some(version)))
    }

    async fn remove(&self, container: &str, key: &str) -> StoreResult<WriteReply> {
        let mut containers = self.containers.write().await;
        let removed = containers
            .get_mut(container)
            .and_then(|entries| entries.remove(key));

        match removed {
            Some(_) => {
                tracing::debug!(container, key, "document removed");
                Ok(WriteReply::code_only(reply::DELETED))
            }
            None => Ok(WriteReply::code_only(reply::NOT_FOUND)),
        }
    }
}
