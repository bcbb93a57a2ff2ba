//! Per-request batching and deduplication of point lookups.
//!
//! An [`EntityLoader`] lives for exactly one dispatch scope (typically one
//! inbound request's resolution pass). `load` registers interest in a key
//! and returns a deferred handle without fetching; `dispatch` fans out one
//! concurrent fetch per distinct pending key and resolves every handle from
//! its key's single result. Nothing is memoized across scopes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::oneshot;

use verdant_types::{Entity, Outcome};

use crate::{ReadOptions, Resource};

/// Failure of a single key's load.
///
/// `NOT_FOUND` never appears here — the loader fulfills missing keys with
/// the scope's default value instead. Every other non-OK outcome fails only
/// the handles registered for that key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("load of {key} failed: {reason}")]
    Failed { key: String, reason: String },

    #[error("dispatch scope ended before the load completed")]
    Abandoned,
}

type LoadResult<V> = Result<V, LoadError>;

/// Deferred handle for one `load` call.
#[derive(Debug)]
pub struct LoadHandle<V> {
    rx: oneshot::Receiver<LoadResult<V>>,
}

impl<V> LoadHandle<V> {
    /// Wait for the key's fetch to complete.
    ///
    /// Pends until some `dispatch` covers the key; resolves immediately if
    /// the key already completed within this scope.
    pub async fn resolve(self) -> LoadResult<V> {
        self.rx.await.unwrap_or(Err(LoadError::Abandoned))
    }
}

/// Counters for one loader scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Underlying fetches actually issued
    pub fetches: u64,
    /// `load` calls satisfied without a new fetch
    pub deduped: u64,
}

struct ScopeState<V> {
    /// Keys registered but not yet dispatched
    pending: HashMap<String, Vec<oneshot::Sender<LoadResult<V>>>>,
    /// Keys whose single fetch is currently running
    in_flight: HashMap<String, Vec<oneshot::Sender<LoadResult<V>>>>,
    /// Keys already resolved within this scope
    completed: HashMap<String, LoadResult<V>>,
}

impl<V> Default for ScopeState<V> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            in_flight: HashMap::new(),
            completed: HashMap::new(),
        }
    }
}

/// Batch/dedup loader over any [`Resource`] backend, scoped to one request.
pub struct EntityLoader<V: Entity> {
    resource: Arc<dyn Resource<V>>,
    on_missing: Arc<dyn Fn(&str) -> V + Send + Sync>,
    state: Mutex<ScopeState<V>>,
    fetches: AtomicU64,
    deduped: AtomicU64,
}

impl<V: Entity> EntityLoader<V> {
    /// Create a loader for one dispatch scope.
    ///
    /// `on_missing` supplies the value a `NOT_FOUND` key resolves to.
    pub fn new(
        resource: Arc<dyn Resource<V>>,
        on_missing: impl Fn(&str) -> V + Send + Sync + 'static,
    ) -> Self {
        Self {
            resource,
            on_missing: Arc::new(on_missing),
            state: Mutex::new(ScopeState::default()),
            fetches: AtomicU64::new(0),
            deduped: AtomicU64::new(0),
        }
    }

    /// Register interest in `key` and return a deferred handle.
    ///
    /// Never blocks and never fetches synchronously. A key requested N times
    /// within the scope triggers exactly one underlying fetch.
    pub fn load(&self, key: &str) -> LoadHandle<V> {
        let (tx, rx) = oneshot::channel();

        let mut state = self.state.lock().expect("loader state poisoned");
        if let Some(result) = state.completed.get(key) {
            self.deduped.fetch_add(1, Ordering::Relaxed);
            let _ = tx.send(result.clone());
        } else if let Some(waiters) = state.in_flight.get_mut(key) {
            self.deduped.fetch_add(1, Ordering::Relaxed);
            waiters.push(tx);
        } else {
            let waiters = state.pending.entry(key.to_string()).or_default();
            if !waiters.is_empty() {
                self.deduped.fetch_add(1, Ordering::Relaxed);
            }
            waiters.push(tx);
        }

        LoadHandle { rx }
    }

    /// Fetch every pending key, concurrently, and resolve its handles.
    ///
    /// Keys loaded while a dispatch is running attach to the in-flight fetch
    /// or wait for the next dispatch; no key ever has two fetches in flight
    /// within one scope.
    pub async fn dispatch(&self) {
        let keys: Vec<String> = {
            let mut state = self.state.lock().expect("loader state poisoned");
            let drained: Vec<(String, Vec<oneshot::Sender<LoadResult<V>>>)> =
                state.pending.drain().collect();
            drained
                .into_iter()
                .map(|(key, waiters)| {
                    state.in_flight.insert(key.clone(), waiters);
                    key
                })
                .collect()
        };

        if keys.is_empty() {
            return;
        }

        tracing::debug!(keys = keys.len(), "dispatching batched loads");
        join_all(keys.into_iter().map(|key| self.fetch_one(key))).await;
    }

    /// Run the single fetch for `key` and fan the result out.
    async fn fetch_one(&self, key: String) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let result = match self.resource.get(&key, ReadOptions::default()).await {
            Ok(resp) => match resp.outcome {
                Outcome::Ok => match resp.payload {
                    Some(value) => Ok(value),
                    None => Err(LoadError::Failed {
                        key: key.clone(),
                        reason: "successful read carried no payload".to_string(),
                    }),
                },
                Outcome::NotFound => Ok((self.on_missing)(&key)),
                Outcome::Internal => Err(LoadError::Failed {
                    key: key.clone(),
                    reason: "backend reported an internal failure".to_string(),
                }),
            },
            Err(err) => Err(LoadError::Failed { key: key.clone(), reason: err.to_string() }),
        };

        let waiters = {
            let mut state = self.state.lock().expect("loader state poisoned");
            state.completed.insert(key.clone(), result.clone());
            state.in_flight.remove(&key).unwrap_or_default()
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            fetches: self.fetches.load(Ordering::Relaxed),
            deduped: self.deduped.load(Ordering::Relaxed),
        }
    }
}
