// HTTP request handlers
use crate::application::binding_registry::BindOutcome;
use crate::application::dashboard_service::{BindingView, DetectionReport, VariableView};
use crate::application::error::DashboardError;
use crate::application::rate_controller::RateChange;
use crate::application::scheduler::{SchedulerState, Strategy};
use crate::application::snapshot_applier::ApplyReport;
use crate::domain::status::StatusReport;
use crate::domain::time_series::axis_labels;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::InvalidRate { .. } => StatusCode::BAD_REQUEST,
            DashboardError::UnknownVariable(_) => StatusCode::NOT_FOUND,
            DashboardError::FetchFailure(_) | DashboardError::DetectFailure(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    #[serde(flatten)]
    pub status: StatusReport,
    pub rate_ms: u32,
    pub strategy: Strategy,
    pub scheduler: SchedulerState,
    pub bindings: usize,
    pub placeholder: bool,
    pub last_tick_ms_ago: Option<u64>,
}

#[derive(Serialize)]
pub struct ChartResponse {
    #[serde(flatten)]
    pub binding: BindingView,
    pub labels: Vec<String>,
}

#[derive(Serialize)]
pub struct ShowAllResponse {
    pub opened: usize,
}

#[derive(Deserialize)]
pub struct RateRequest {
    pub rate: serde_json::Value,
}

#[derive(Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    let scheduler = state.scheduler.lock().await;
    let bindings = state.dashboard.binding_count();
    Json(SchedulerStatus {
        status: state.dashboard.status(),
        rate_ms: scheduler.rate_ms(),
        strategy: scheduler.strategy(),
        scheduler: scheduler.state(),
        bindings,
        placeholder: bindings == 0,
        last_tick_ms_ago: state
            .dashboard
            .last_tick_at()
            .map(|at| at.elapsed().as_millis() as u64),
    })
}

pub async fn list_variables(State(state): State<Arc<AppState>>) -> Json<Vec<VariableView>> {
    Json(state.dashboard.variables())
}

pub async fn get_variable(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<VariableView>, DashboardError> {
    state
        .dashboard
        .variable(&name)
        .map(Json)
        .ok_or(DashboardError::UnknownVariable(name))
}

/// Reload the whole catalog from the provider
pub async fn refresh_variables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApplyReport>, DashboardError> {
    state.dashboard.refresh_catalog().await.map(Json)
}

pub async fn detect_variables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DetectionReport>, DashboardError> {
    state.dashboard.detect_variables().await.map(Json)
}

/// Text handed to the rate controller; strings are passed through untouched
fn rate_input(rate: &serde_json::Value) -> String {
    match rate {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accepts `{"rate": 250}` or `{"rate": "250"}`
pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RateRequest>,
) -> Result<Json<RateChange>, DashboardError> {
    let raw = rate_input(&request.rate);
    let mut scheduler = state.scheduler.lock().await;
    state
        .rate_controller
        .request_rate_change(&mut scheduler, &raw)
        .map(Json)
}

pub async fn show_all(State(state): State<Arc<AppState>>) -> Json<ShowAllResponse> {
    Json(ShowAllResponse {
        opened: state.dashboard.show_all(),
    })
}

pub async fn clear_all(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dashboard.clear_all();
    StatusCode::NO_CONTENT
}

async fn chart(state: &AppState, name: String) -> Result<ChartResponse, DashboardError> {
    let rate_ms = state.scheduler.lock().await.rate_ms();
    let binding = state
        .dashboard
        .binding(&name)
        .ok_or(DashboardError::UnknownVariable(name))?;
    Ok(ChartResponse {
        binding,
        labels: axis_labels(rate_ms),
    })
}

pub async fn get_binding(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartResponse>, DashboardError> {
    chart(&state, name).await.map(Json)
}

pub async fn bind_variable(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ChartResponse>), DashboardError> {
    let status = match state.dashboard.bind(&name)? {
        BindOutcome::Created => StatusCode::CREATED,
        BindOutcome::Existing => StatusCode::OK,
    };
    Ok((status, Json(chart(&state, name).await?)))
}

pub async fn unbind_variable(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.dashboard.unbind(&name) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Pause or resume one chart
pub async fn set_binding_active(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActiveRequest>,
) -> Result<Json<ChartResponse>, DashboardError> {
    state.dashboard.set_active(&name, request.active)?;
    chart(&state, name).await.map(Json)
}

pub async fn clear_binding_data(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChartResponse>, DashboardError> {
    state.dashboard.clear_data(&name)?;
    chart(&state, name).await.map(Json)
}

/// Server-sent events: status updates and chart samples
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.feed.subscribe()).filter_map(|message| async move {
        match message {
            Ok(event) => match Event::default().event(event.kind()).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::error!("Failed to encode event: {}", e);
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!("Event subscriber lagged, skipped {} events", skipped);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
