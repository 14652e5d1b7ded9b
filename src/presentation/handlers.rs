// HTTP request handlers
use crate::application::session_service::FilterAction;
use crate::domain::filter::{Dimension, FilterValue};
use crate::infrastructure::http_response::ApiError;
use crate::infrastructure::json_mapper::{
    DashboardDto, DatasetSummaryDto, SessionDto, dashboard_to_json, dataset_to_json,
};
use crate::infrastructure::sse::stream_from_receiver;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

/// A selection value as sent by the client: years may arrive as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SelectionValue {
    Number(i64),
    Text(String),
}

impl From<SelectionValue> for FilterValue {
    fn from(value: SelectionValue) -> Self {
        match value {
            SelectionValue::Number(n) => FilterValue::Number(n),
            SelectionValue::Text(s) => FilterValue::Text(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceSelection {
    pub values: Vec<SelectionValue>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Summary of the currently cached dataset
pub async fn dataset_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetSummaryDto>, ApiError> {
    let dataset = state.dataset_cache.get().await?;
    Ok(Json(dataset_to_json(
        &dataset,
        state.source.clone(),
        state.table.clone(),
    )))
}

/// Drop the cached dataset and read the table again
pub async fn reload_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetSummaryDto>, ApiError> {
    let dataset = state.dataset_cache.reload().await?;
    Ok(Json(dataset_to_json(
        &dataset,
        state.source.clone(),
        state.table.clone(),
    )))
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionDto>), ApiError> {
    let (session_id, view) = state.session_service.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionDto {
            session_id,
            dashboard: dashboard_to_json(&view),
        }),
    ))
}

pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardDto>, ApiError> {
    let view = state.session_service.view(&id).await?;
    Ok(Json(dashboard_to_json(&view)))
}

pub async fn delete_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.session_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace one dimension's selection with an explicit list
pub async fn replace_filter(
    Path((id, dimension)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplaceSelection>,
) -> Result<Json<DashboardDto>, ApiError> {
    let values = body.values.into_iter().map(FilterValue::from).collect();
    apply_filter(&state, &id, &dimension, FilterAction::Replace(values)).await
}

pub async fn select_all(
    Path((id, dimension)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardDto>, ApiError> {
    apply_filter(&state, &id, &dimension, FilterAction::SelectAll).await
}

pub async fn select_none(
    Path((id, dimension)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardDto>, ApiError> {
    apply_filter(&state, &id, &dimension, FilterAction::SelectNone).await
}

async fn apply_filter(
    state: &AppState,
    id: &str,
    dimension: &str,
    action: FilterAction,
) -> Result<Json<DashboardDto>, ApiError> {
    let dimension: Dimension = dimension.parse()?;
    let view = state.session_service.apply(id, dimension, action).await?;
    Ok(Json(dashboard_to_json(&view)))
}

/// Push a fresh dashboard to the client after every filter change
pub async fn session_events(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let (rx, initial) = state.session_service.watch(&id).await?;
    Ok(stream_from_receiver(initial, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::dataset_cache::test_support::StubRepository;
    use crate::application::dataset_cache::{DEFAULT_TTL, DatasetCache};
    use crate::application::session_service::{DEFAULT_IDLE_TIMEOUT, SessionService};
    use crate::domain::chart::ChartOptions;
    use crate::domain::record::RawCell;
    use crate::domain::record::fixtures::raw_row;

    fn state(repo: Arc<StubRepository>) -> Arc<AppState> {
        let cache = Arc::new(DatasetCache::new(repo, DEFAULT_TTL, "Unknown".to_string()));
        Arc::new(AppState {
            session_service: SessionService::new(
                cache.clone(),
                DashboardService::new("Test".to_string(), ChartOptions::default()),
                DEFAULT_IDLE_TIMEOUT,
            ),
            dataset_cache: cache,
            source: "memory".to_string(),
            table: "mortes".to_string(),
        })
    }

    fn stub() -> Arc<StubRepository> {
        Arc::new(StubRepository::new(vec![
            raw_row(RawCell::Integer(2019), RawCell::Integer(30), Some("Fall")),
            raw_row(RawCell::Integer(2020), RawCell::Integer(40), Some("Burns")),
        ]))
    }

    fn to_value(dto: impl serde::Serialize) -> serde_json::Value {
        serde_json::to_value(dto).unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = state(stub());

        let (status, Json(created)) = create_session(State(state.clone())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let id = created.session_id.clone();
        assert_eq!(to_value(&created.dashboard)["kpis"]["total_fatalities"], 2);

        let body: ReplaceSelection = serde_json::from_str(r#"{"values": [2020]}"#).unwrap();
        let Json(updated) = replace_filter(
            Path((id.clone(), "year".to_string())),
            State(state.clone()),
            Json(body),
        )
        .await
        .unwrap();
        let updated = to_value(&updated);
        assert_eq!(updated["kpis"]["total_fatalities"], 1);
        assert_eq!(updated["kpis"]["modal_rank"], "Captain");

        let Json(none) = select_none(
            Path((id.clone(), "cause".to_string())),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(to_value(&none)["status"], "empty");

        let Json(all) = select_all(Path((id.clone(), "cause".to_string())), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(to_value(&all)["kpis"]["total_fatalities"], 1);

        let status = delete_session(Path(id.clone()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let err = get_session(Path(id), State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_dimension_is_not_found() {
        let state = state(stub());
        let (_, Json(created)) = create_session(State(state.clone())).await.unwrap();

        let err = select_all(
            Path((created.session_id, "rank".to_string())),
            State(state),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unavailable_data_halts_dashboard() {
        let repo = stub();
        repo.set_failing(true);
        let state = state(repo);

        let err = create_session(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.0.to_string().contains("mortes"));
    }

    #[tokio::test]
    async fn test_reload_reports_new_generation() {
        let repo = stub();
        let state = state(repo.clone());

        let Json(first) = dataset_summary(State(state.clone())).await.unwrap();
        assert_eq!(first.records, 2);
        assert_eq!(first.available.years, vec![2019, 2020]);

        repo.set_rows(vec![raw_row(RawCell::Integer(2021), RawCell::Integer(25), None)]);
        let Json(second) = reload_dataset(State(state)).await.unwrap();
        assert_eq!(second.records, 1);
        assert_eq!(second.generation, first.generation + 1);
        assert_eq!(second.available.causes, vec!["Unknown"]);
    }

    #[test]
    fn test_selection_values_accept_numbers_and_text() {
        let body: ReplaceSelection =
            serde_json::from_str(r#"{"values": [2019, "Career"]}"#).unwrap();
        let values: Vec<FilterValue> = body.values.into_iter().map(FilterValue::from).collect();
        assert_eq!(
            values,
            vec![
                FilterValue::Number(2019),
                FilterValue::Text("Career".to_string())
            ]
        );
    }
}
