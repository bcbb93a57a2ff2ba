//! System initialization module
//!
//! Handles first-startup seeding of the default account.
//!
//! # Initialization Flow
//!
//! 1. Resolve the default account id (config value or well-known default)
//! 2. If the account already exists, return its id (already initialized)
//! 3. Otherwise create it and return its id

use std::sync::Arc;

use anyhow::{Context, Result};
use verdant_config::Config;
use verdant_resource::{DocumentResource, ReadOptions, Resource};
use verdant_store::DocumentStore;
use verdant_types::{Account, Outcome};

const DEFAULT_ACCOUNT_ID: &str = "account:default";

/// Initialize the system on first startup.
///
/// Idempotent and safe to call on every startup: an existing default
/// account is reused, never recreated.
pub async fn initialize_system(store: &Arc<dyn DocumentStore>, config: &Config) -> Result<String> {
    let accounts: DocumentResource<Account> = DocumentResource::new(Arc::clone(store));

    let account_id = config
        .bootstrap
        .default_account
        .clone()
        .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string());

    let existing = accounts
        .get(&account_id, ReadOptions::default())
        .await
        .context("Failed to look up the default account")?;

    match existing.outcome {
        Outcome::Ok => {
            tracing::info!(account_id = %account_id, "System already initialized");
            return Ok(account_id);
        }
        Outcome::NotFound => {}
        Outcome::Internal => {
            anyhow::bail!("Storage backend failed while checking for the default account");
        }
    }

    let account = Account {
        id: account_id.clone(),
        email: "admin@localhost".to_string(),
        display_name: "Default Account".to_string(),
        active: true,
    };

    let created = accounts.create(&account).await.context("Failed to create the default account")?;
    if created.outcome != Outcome::Ok {
        anyhow::bail!("Storage backend rejected the default account");
    }

    tracing::info!(account_id = %account_id, "Created default account");
    Ok(account_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdant_store::MemoryStore;

    fn memory() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn first_startup_seeds_the_default_account() {
        let store = memory();
        let id = initialize_system(&store, &Config::default()).await.unwrap();
        assert_eq!(id, DEFAULT_ACCOUNT_ID);
    }

    #[tokio::test]
    async fn second_startup_reuses_the_account() {
        let store = memory();
        let config = Config::default();

        let first = initialize_system(&store, &config).await.unwrap();
        let second = initialize_system(&store, &config).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn configured_account_id_is_honored() {
        let store = memory();
        let mut config = Config::default();
        config.bootstrap.default_account = Some("account:acme".to_string());

        let id = initialize_system(&store, &config).await.unwrap();
        assert_eq!(id, "account:acme");
    }
}
