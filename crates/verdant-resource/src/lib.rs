//! # Verdant Resource - Generic Storage-Resource Abstraction
//!
//! A uniform get/create/update/delete contract over keyed entities, with two
//! interchangeable backends (direct document-store access and remote-proxy
//! access), a query-by-example compiler, and a per-request batch/dedup
//! loader.
//!
//! Every entity service in Verdant is an instantiation of this layer; the
//! services themselves carry no storage logic of their own.

use async_trait::async_trait;

use verdant_types::{Entity, Outcome, ResourceResult, VersionTag};

pub mod document;
pub mod loader;
pub mod remote;
pub mod status;
pub mod template;

pub use document::{DocumentResource, PreconditionPolicy};
pub use loader::{EntityLoader, LoadError, LoadHandle};
pub use remote::{RemoteEnvelope, RemoteEntityClient, RemoteResource};
pub use template::{FilterQuery, Template};

// ============================================================================
// Response Envelope
// ============================================================================

/// The envelope every resource operation returns.
///
/// Constructed fresh per call and immutable afterwards. For reads, `payload`
/// is present if and only if `outcome` is [`Outcome::Ok`]; for writes the
/// payload stays empty and `metadata` carries the write result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceResponse<T> {
    pub outcome: Outcome,
    pub payload: Option<T>,
    pub metadata: Option<VersionTag>,
}

impl<T> ResourceResponse<T> {
    /// A successful read carrying its payload
    pub fn ok(payload: T, metadata: Option<VersionTag>) -> Self {
        Self { outcome: Outcome::Ok, payload: Some(payload), metadata }
    }

    /// The addressed entity does not exist
    pub fn not_found() -> Self {
        Self { outcome: Outcome::NotFound, payload: None, metadata: None }
    }

    /// A failure with no specific business meaning
    pub fn internal() -> Self {
        Self { outcome: Outcome::Internal, payload: None, metadata: None }
    }

    /// A response carrying only an outcome and optional write metadata
    pub fn of(outcome: Outcome, metadata: Option<VersionTag>) -> Self {
        Self { outcome, payload: None, metadata }
    }
}

impl ResourceResponse<()> {
    /// A successful write carrying its concurrency token
    pub fn write_ok(metadata: Option<VersionTag>) -> Self {
        Self { outcome: Outcome::Ok, payload: None, metadata }
    }
}

// ============================================================================
// Per-Call Options
// ============================================================================

/// Options for read operations.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Read no earlier than the state that produced this token.
    /// Passed through to backends that understand it; advisory otherwise.
    pub consistent_with: Option<VersionTag>,
}

/// Options for update operations.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Create the entity if absent, fully replace it if present.
    /// The document backend supports only `true`; `false` is a contract
    /// violation raised synchronously.
    pub upsert: bool,
    /// Concurrency token from an earlier read, for staleness detection
    pub if_match: Option<VersionTag>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { upsert: true, if_match: None }
    }
}

// ============================================================================
// Resource Contract
// ============================================================================

/// The uniform storage contract over a keyed entity type.
///
/// `create`, `update` and `delete` mutate backend state; `get` is pure.
/// No operation retries internally — retry policy belongs to the transport.
#[async_trait]
pub trait Resource<V: Entity>: Send + Sync {
    /// Fetch the entity under `key`
    async fn get(&self, key: &str, opts: ReadOptions) -> ResourceResult<ResourceResponse<V>>;

    /// Insert a new entity
    async fn create(&self, value: &V) -> ResourceResult<ResourceResponse<()>>;

    /// Create-or-replace the entity (upsert only; see [`WriteOptions`])
    async fn update(&self, value: &V, opts: WriteOptions) -> ResourceResult<ResourceResponse<()>>;

    /// Delete the entity under `key`
    async fn delete(&self, key: &str) -> ResourceResult<ResourceResponse<()>>;
}
