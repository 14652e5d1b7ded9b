// Time-bounded memoization of the fatality table load
use crate::application::fatality_repository::FatalityRepository;
use crate::domain::record::Dataset;
use crate::error::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    table: String,
}

struct CacheEntry {
    loaded_at: Instant,
    /// Failures are cached too; they are only retried after expiry or reload.
    outcome: std::result::Result<Arc<Dataset>, Arc<Error>>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_generation: u64,
}

pub struct DatasetCache {
    repository: Arc<dyn FatalityRepository>,
    ttl: Duration,
    sentinel: String,
    state: Mutex<CacheState>,
}

impl DatasetCache {
    pub fn new(repository: Arc<dyn FatalityRepository>, ttl: Duration, sentinel: String) -> Self {
        Self {
            repository,
            ttl,
            sentinel,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn key(&self) -> CacheKey {
        CacheKey {
            source: self.repository.source_location(),
            table: self.repository.table_name(),
        }
    }

    /// Cached dataset if younger than the TTL, otherwise reload and replace.
    pub async fn get(&self) -> Result<Arc<Dataset>> {
        let key = self.key();
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get(&key) {
            if entry.loaded_at.elapsed() < self.ttl {
                tracing::debug!("Dataset cache hit for {}:{}", key.source, key.table);
                return entry.outcome.clone().map_err(Error::DataUnavailable);
            }
            tracing::debug!("Dataset cache entry for {}:{} expired", key.source, key.table);
        }

        self.load_into(&mut state, key).await
    }

    /// Drop the cached entry and load again immediately.
    pub async fn reload(&self) -> Result<Arc<Dataset>> {
        let key = self.key();
        let mut state = self.state.lock().await;
        state.entries.remove(&key);
        tracing::info!("Dataset cache invalidated for {}:{}", key.source, key.table);
        self.load_into(&mut state, key).await
    }

    async fn load_into(&self, state: &mut CacheState, key: CacheKey) -> Result<Arc<Dataset>> {
        let started = Instant::now();
        let outcome = match self.repository.fetch_all().await {
            Ok(rows) => {
                state.next_generation += 1;
                let (dataset, dropped) =
                    Dataset::from_raw_rows(rows, &self.sentinel, state.next_generation, Utc::now());
                tracing::info!(
                    "Loaded {} records from {}:{} ({} dropped, generation {}) in {}ms",
                    dataset.len(),
                    key.source,
                    key.table,
                    dropped,
                    dataset.generation(),
                    started.elapsed().as_millis()
                );
                if dataset.is_empty() {
                    tracing::warn!("{}:{} has no usable rows", key.source, key.table);
                }
                Ok(Arc::new(dataset))
            }
            Err(e) => {
                tracing::error!("Failed to load {}:{}: {}", key.source, key.table, e);
                Err(Arc::new(e))
            }
        };

        state.entries.insert(
            key,
            CacheEntry {
                loaded_at: Instant::now(),
                outcome: outcome.clone(),
            },
        );
        outcome.map_err(Error::DataUnavailable)
    }
}
