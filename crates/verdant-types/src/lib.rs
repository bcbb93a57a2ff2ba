//! # Verdant Types
//!
//! Shared type definitions for the Verdant entity services.
//!
//! This crate provides the types used across the Verdant ecosystem,
//! ensuring a single source of truth and preventing circular dependencies.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Entity Contract
// ============================================================================

/// A keyed, document-shaped value that the resource layer can store.
///
/// Every entity lives in its own container and is addressed by a non-empty
/// string key held in a single scalar field (`key_field`).
pub trait Entity:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Name of the backend container holding this entity type
    fn container() -> &'static str;

    /// Name of the field carrying the key (the unique identifier)
    fn key_field() -> &'static str {
        "id"
    }

    /// The entity's key value
    fn key(&self) -> &str;
}

// ============================================================================
// Core Domain Entities
// ============================================================================

/// A user account owning gardens and gardener profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub active: bool,
}

/// A garden belonging to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garden {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub hardiness_zone: i64,
    pub public: bool,
}

/// A gardener profile (a person tending one or more gardens)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gardener {
    pub id: String,
    pub account_id: String,
    pub name: String,
}

/// A plant growing in a garden
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    pub garden_id: String,
    pub species: String,
    pub planted_year: i64,
}

/// Something that happened in a garden (planting, pruning, harvest, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenEvent {
    pub id: String,
    pub garden_id: String,
    pub kind: String,
    pub note: String,
}

macro_rules! impl_entity {
    ($ty:ty, $container:literal) => {
        impl Entity for $ty {
            fn container() -> &'static str {
                $container
            }

            fn key(&self) -> &str {
                &self.id
            }
        }
    };
}

impl_entity!(Account, "accounts");
impl_entity!(Garden, "gardens");
impl_entity!(Gardener, "gardeners");
impl_entity!(Plant, "plants");
impl_entity!(GardenEvent, "events");

// ============================================================================
// Outcome and Metadata
// ============================================================================

/// Canonical, backend-agnostic outcome of a resource operation.
///
/// Every backend-specific code (transport status or store reply code) maps
/// to exactly one of these; an unmapped code is a translator defect, not a
/// valid runtime outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The operation succeeded
    Ok,
    /// The addressed entity does not exist
    NotFound,
    /// Any failure with no specific business meaning
    Internal,
}

impl Outcome {
    /// Whether the outcome represents success
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// Opaque concurrency token returned alongside successful reads and writes.
///
/// Carries no semantics beyond "pass back on a later write to detect
/// staleness". Whether anything validates it is a per-resource policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag(pub String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Scalar Literals
// ============================================================================

/// The closed set of scalar literal kinds usable as equality predicates.
///
/// Non-scalar values (nested objects, lists) are never predicates; the
/// query compiler skips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Connection-level failures of the document store collaborator.
///
/// "Not found" and "conflict" are not errors at this level; the store
/// reports them through its reply codes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures of the resource layer that are not representable as an
/// [`Outcome`]. Callers pattern-match on the class:
///
/// - [`ResourceError::Integrity`] is fatal backend corruption (a unique key
///   resolved to several records) and must never be folded into a normal
///   outcome or retried.
/// - [`ResourceError::Contract`] is a programming mistake by the caller,
///   raised synchronously.
/// - The remaining variants are plumbing failures below the outcome model.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Contract violation: {0}")]
    Contract(&'static str),

    #[error("Query template has no scalar predicates")]
    EmptyTemplate,

    #[error("Query template must serialize to an object, got {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_containers_are_distinct() {
        let containers = [
            Account::container(),
            Garden::container(),
            Gardener::container(),
            Plant::container(),
            GardenEvent::container(),
        ];
        let unique: std::collections::HashSet<_> = containers.iter().collect();
        assert_eq!(unique.len(), containers.len());
    }

    #[test]
    fn entity_key_reads_id_field() {
        let garden = Garden {
            id: "garden:42".to_string(),
            account_id: "acct:1".to_string(),
            name: "Back plot".to_string(),
            hardiness_zone: 7,
            public: false,
        };
        assert_eq!(garden.key(), "garden:42");
        assert_eq!(Garden::key_field(), "id");
    }

    #[test]
    fn outcome_is_ok() {
        assert!(Outcome::Ok.is_ok());
        assert!(!Outcome::NotFound.is_ok());
        assert!(!Outcome::Internal.is_ok());
    }

    #[test]
    fn literal_conversions() {
        assert_eq!(Literal::from("x"), Literal::String("x".to_string()));
        assert_eq!(Literal::from(7i64), Literal::Integer(7));
        assert_eq!(Literal::from(true), Literal::Boolean(true));
    }

    #[test]
    fn error_display() {
        let err = ResourceError::Integrity("key garden:1 matched 2 documents".to_string());
        assert_eq!(
            err.to_string(),
            "Integrity violation: key garden:1 matched 2 documents"
        );

        let err = ResourceError::Contract("update without upsert is not supported");
        assert!(err.to_string().starts_with("Contract violation"));
    }
}
