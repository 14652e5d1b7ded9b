// Session service - Per-session filter state and recompute-on-change
use crate::application::dashboard_service::DashboardService;
use crate::application::dataset_cache::DatasetCache;
use crate::domain::dashboard::DashboardView;
use crate::domain::filter::{Dimension, FilterState, FilterValue};
use crate::domain::record::Dataset;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

const UPDATE_CHANNEL_CAPACITY: usize = 16;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1800);

struct Session {
    filters: FilterState,
    updates: broadcast::Sender<Arc<DashboardView>>,
    last_touched: Instant,
}

impl Session {
    /// A session with a connected event stream never counts as idle.
    fn is_idle(&self, timeout: Duration) -> bool {
        self.updates.receiver_count() == 0 && self.last_touched.elapsed() > timeout
    }
}

/// A filter mutation requested by a client.
#[derive(Debug, Clone)]
pub enum FilterAction {
    Replace(Vec<FilterValue>),
    SelectAll,
    SelectNone,
}

#[derive(Clone)]
pub struct SessionService {
    cache: Arc<DatasetCache>,
    renderer: DashboardService,
    idle_timeout: Duration,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionService {
    pub fn new(
        cache: Arc<DatasetCache>,
        renderer: DashboardService,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            renderer,
            idle_timeout,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a session with every value selected and render it.
    pub async fn create(&self) -> Result<(String, Arc<DashboardView>)> {
        let dataset = self.cache.get().await?;
        let filters = FilterState::all(&dataset);
        let view = Arc::new(self.renderer.render(&dataset, &filters));
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions);
        sessions.insert(
            id.clone(),
            Session {
                filters,
                updates,
                last_touched: Instant::now(),
            },
        );
        tracing::info!(
            "Created session {} over {} records ({} active)",
            id,
            dataset.len(),
            sessions.len()
        );

        Ok((id, view))
    }

    /// Current view of a session, reconciled against the latest dataset.
    pub async fn view(&self, id: &str) -> Result<Arc<DashboardView>> {
        let dataset = self.cache.get().await?;
        let mut sessions = self.sessions.lock().await;
        let session = self.touch(&mut sessions, id)?;
        Ok(self.current(id, session, &dataset))
    }

    /// Subscribe to a session's updates together with its current view.
    /// The view is not sent on the returned receiver; only later changes are.
    pub async fn watch(
        &self,
        id: &str,
    ) -> Result<(broadcast::Receiver<Arc<DashboardView>>, Arc<DashboardView>)> {
        let dataset = self.cache.get().await?;
        let mut sessions = self.sessions.lock().await;
        let session = self.touch(&mut sessions, id)?;
        let view = self.current(id, session, &dataset);
        Ok((session.updates.subscribe(), view))
    }

    /// Apply a filter mutation, recompute the view and notify subscribers.
    pub async fn apply(
        &self,
        id: &str,
        dimension: Dimension,
        action: FilterAction,
    ) -> Result<Arc<DashboardView>> {
        let dataset = self.cache.get().await?;
        let mut sessions = self.sessions.lock().await;
        let session = self.touch(&mut sessions, id)?;

        session.filters.reconcile(&dataset);
        let available = dataset.available();
        match &action {
            FilterAction::Replace(values) => {
                let discarded = session.filters.replace(dimension, values, available);
                if discarded > 0 {
                    tracing::debug!(
                        "Session {}: ignored {} unavailable {} values",
                        id,
                        discarded,
                        dimension
                    );
                }
            }
            FilterAction::SelectAll => session.filters.select_all(dimension, available),
            FilterAction::SelectNone => session.filters.select_none(dimension),
        }
        tracing::debug!("Session {}: {:?} on {}", id, action, dimension);

        Ok(self.publish(session, &dataset))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .lock()
            .await
            .remove(id)
            .map(|_| tracing::info!("Deleted session {}", id))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Drop idle sessions, then look up `id` and mark it as used.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, Session>,
        id: &str,
    ) -> Result<&'a mut Session> {
        self.evict_idle(sessions);
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.last_touched = Instant::now();
        Ok(session)
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, Session>) {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(self.idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(
                "Evicted {} idle sessions ({} active)",
                evicted,
                sessions.len()
            );
        }
    }

    /// Render the session, reconciling first if the dataset was reloaded.
    /// A reconcile is a recompute, so existing subscribers hear about it.
    fn current(&self, id: &str, session: &mut Session, dataset: &Dataset) -> Arc<DashboardView> {
        let previous = session.filters.generation();
        if session.filters.reconcile(dataset) {
            tracing::info!(
                "Session {} reconciled from dataset generation {} to {}",
                id,
                previous,
                dataset.generation()
            );
            return self.publish(session, dataset);
        }
        Arc::new(self.renderer.render(dataset, &session.filters))
    }

    fn publish(&self, session: &Session, dataset: &Dataset) -> Arc<DashboardView> {
        let view = Arc::new(self.renderer.render(dataset, &session.filters));
        if view.is_empty() {
            tracing::debug!("Current filters exclude every record");
        }
        // No subscribers is fine; the caller still gets the view.
        let _ = session.updates.send(view.clone());
        view
    }
}
