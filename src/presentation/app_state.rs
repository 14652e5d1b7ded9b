// Application state for HTTP handlers
use crate::application::dataset_cache::DatasetCache;
use crate::application::session_service::SessionService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dataset_cache: Arc<DatasetCache>,
    pub session_service: SessionService,
    /// Reported by the dataset endpoints.
    pub source: String,
    pub table: String,
}
