//! Storage factory for creating backend instances
//!
//! Lets consumers pick a backend from configuration without depending on
//! implementation details.

use std::str::FromStr;
use std::sync::Arc;

use verdant_types::StoreError;

use crate::memory::MemoryStore;
use crate::DocumentStore;

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory storage (for testing and development)
    Memory,
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            _ => Err(StoreError::Internal(format!("Unknown backend kind: {}", s))),
        }
    }
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
        }
    }
}

/// Configuration for the storage backend
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend kind to use
    pub backend: BackendKind,
    /// Optional connection string for externally hosted document services
    pub connection_string: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: BackendKind::Memory, connection_string: None }
    }
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self::default()
    }
}

/// Storage factory for creating backend instances
pub struct StoreFactory;

impl StoreFactory {
    /// Create a document store from configuration
    pub fn create(config: StorageConfig) -> Arc<dyn DocumentStore> {
        match config.backend {
            BackendKind::Memory => Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>,
        }
    }

    /// Create a document store from string configuration
    pub fn from_str(
        backend_str: &str,
        connection_string: Option<String>,
    ) -> Result<Arc<dyn DocumentStore>, StoreError> {
        let backend = BackendKind::from_str(backend_str)?;
        Ok(Self::create(StorageConfig { backend, connection_string }))
    }

    /// Create the default memory backend
    pub fn memory() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
    }
}
