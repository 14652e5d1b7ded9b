// Server-sent event streaming of dashboard updates
use crate::domain::dashboard::DashboardView;
use crate::infrastructure::json_mapper::dashboard_to_json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub const DASHBOARD_EVENT: &str = "dashboard";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// JSON body of a `dashboard` event.
fn dashboard_payload(view: &DashboardView) -> serde_json::Result<String> {
    serde_json::to_string(&dashboard_to_json(view))
}

/// Serialise a view as one `dashboard` event.
pub fn dashboard_event(view: &DashboardView) -> Event {
    match dashboard_payload(view) {
        Ok(payload) => Event::default().event(DASHBOARD_EVENT).data(payload),
        Err(e) => {
            tracing::error!("Failed to serialise dashboard event: {}", e);
            Event::default().event("error").data(e.to_string())
        }
    }
}

/// `initial` followed by every view published on `rx`, until the sender
/// side (the session) goes away.
pub fn dashboard_updates(
    initial: Arc<DashboardView>,
    mut rx: broadcast::Receiver<Arc<DashboardView>>,
) -> impl Stream<Item = Arc<DashboardView>> {
    async_stream::stream! {
        yield initial;
        loop {
            match rx.recv().await {
                Ok(view) => yield view,
                // A slow client only needs the newest view.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("SSE subscriber lagged by {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

pub fn stream_from_receiver(
    initial: Arc<DashboardView>,
    rx: broadcast::Receiver<Arc<DashboardView>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = dashboard_updates(initial, rx).map(|view| Ok(dashboard_event(&view)));
    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
