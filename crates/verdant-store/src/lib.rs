//! # Verdant Store - Document-Store Boundary
//!
//! The contract with the document database consumed by the resource layer.
//! The store engine itself is an external collaborator; this crate only
//! defines its surface and ships an in-memory backend for development and
//! tests.

use async_trait::async_trait;
use serde_json::Value;

use verdant_types::{Literal, StoreResult, VersionTag};

pub mod factory;
pub mod memory;

pub use factory::{BackendKind, StorageConfig, StoreFactory};
pub use memory::MemoryStore;

// ============================================================================
// Reply Codes
// ============================================================================

/// HTTP-like reply codes the document store returns on its own success path.
///
/// These feed the status translator in the resource layer; they are the
/// store's vocabulary, not ours.
pub mod reply {
    /// Existing document fully replaced
    pub const REPLACED: u16 = 200;
    /// New document created
    pub const CREATED: u16 = 201;
    /// Document deleted
    pub const DELETED: u16 = 204;
    /// No document under the addressed key
    pub const NOT_FOUND: u16 = 404;
    /// A document already exists under the addressed key
    pub const CONFLICT: u16 = 409;
    /// The store failed internally
    pub const FAILURE: u16 = 500;
}

// ============================================================================
// Documents and Replies
// ============================================================================

/// A stored document: an opaque JSON body plus its current version tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub body: Value,
    pub version: VersionTag,
}

/// Result of a write operation against the store.
///
/// `version` is present whenever the write produced or touched a document.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReply {
    pub code: u16,
    pub version: Option<VersionTag>,
}

impl WriteReply {
    pub fn new(code: u16, version: Option<VersionTag>) -> Self {
        Self { code, version }
    }

    /// A reply with a code and no version (not-found, failure)
    pub fn code_only(code: u16) -> Self {
        Self { code, version: None }
    }
}

// ============================================================================
// Filter Queries
// ============================================================================

/// A compiled conjunctive-equality filter over one container.
///
/// Carries both the bit-exact SQL text sent to a real document store
/// (`SELECT * FROM c WHERE c.f = lit [AND ...]`) and the structured clauses,
/// so the in-memory backend can evaluate without parsing SQL.
#[derive(Debug, Clone)]
pub struct FilterQuery {
    container: String,
    clauses: Vec<(String, Literal)>,
    sql: String,
}

impl FilterQuery {
    /// Assemble a compiled query. The query-by-example compiler in the
    /// resource layer is the sole producer; `sql` must render `clauses`.
    pub fn new(
        container: impl Into<String>,
        clauses: Vec<(String, Literal)>,
        sql: String,
    ) -> Self {
        Self { container: container.into(), clauses, sql }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn clauses(&self) -> &[(String, Literal)] {
        &self.clauses
    }

    /// The exact filter expression consumed by the store's query surface
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Whether a document body satisfies every clause.
    ///
    /// Used by backends that evaluate structurally instead of executing SQL.
    pub fn matches(&self, body: &Value) -> bool {
        self.clauses.iter().all(|(field, literal)| {
            match (body.get(field), literal) {
                (Some(Value::String(s)), Literal::String(want)) => s == want,
                (Some(Value::Number(n)), Literal::Integer(want)) => {
                    n.as_i64() == Some(*want)
                }
                (Some(Value::Bool(b)), Literal::Boolean(want)) => b == want,
                _ => false,
            }
        })
    }
}

// ============================================================================
// Store Contract
// ============================================================================

/// The document database's operation surface.
///
/// All operations are synchronous round trips from the caller's point of
/// view; there is no internal retry. Connection-level failures surface as
/// [`verdant_types::StoreError`]; business conditions (not found, conflict)
/// surface through [`WriteReply`] codes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Execute a compiled filter query, returning every matching document
    async fn query(&self, query: &FilterQuery) -> StoreResult<Vec<Document>>;

    /// Insert a new document; replies `CONFLICT` if the key is taken
    async fn insert(&self, container: &str, key: &str, body: Value) -> StoreResult<WriteReply>;

    /// Create or fully replace the document under `key`
    async fn upsert(&self, container: &str, key: &str, body: Value) -> StoreResult<WriteReply>;

    /// Delete the document under `key`; replies `NOT_FOUND` if absent
    async fn remove(&self, container: &str, key: &str) -> StoreResult<WriteReply>;
}
