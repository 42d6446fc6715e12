//! JSON endpoint handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vitasense_core::{AnalysisResult, CoreError, HeartRateScenario, Scenario, TemperatureScenario};
use vitasense_monitor::DashboardSnapshot;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(e: CoreError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config_summary.clone())
}

// ── Dashboard ─────────────────────────────────────────────────────

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.monitor.snapshot().await)
}

// ── Scenarios ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInfo {
    pub tag: &'static str,
    pub base: f64,
    pub fluctuation: f64,
    pub trend: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenariosResponse {
    pub temperature: Vec<ScenarioInfo>,
    pub heart_rate: Vec<ScenarioInfo>,
}

fn scenario_infos<S: Scenario>() -> Vec<ScenarioInfo> {
    S::all()
        .iter()
        .map(|s| {
            let c = s.config();
            ScenarioInfo {
                tag: s.label(),
                base: c.base,
                fluctuation: c.fluctuation,
                trend: c.trend,
            }
        })
        .collect()
}

pub async fn scenarios() -> Json<ScenariosResponse> {
    Json(ScenariosResponse {
        temperature: scenario_infos::<TemperatureScenario>(),
        heart_rate: scenario_infos::<HeartRateScenario>(),
    })
}

#[derive(Deserialize)]
pub struct ScenarioRequest {
    pub scenario: String,
}

pub async fn set_temperature_scenario(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let scenario: TemperatureScenario = req.scenario.parse().map_err(bad_request)?;
    state.monitor.set_temperature_scenario(scenario).await;
    Ok(Json(state.monitor.snapshot().await))
}

pub async fn set_heart_rate_scenario(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let scenario: HeartRateScenario = req.scenario.parse().map_err(bad_request)?;
    state.monitor.set_heart_rate_scenario(scenario).await;
    Ok(Json(state.monitor.snapshot().await))
}

// ── Mute & alerts ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MuteResponse {
    pub muted: bool,
}

pub async fn toggle_mute(State(state): State<Arc<AppState>>) -> Json<MuteResponse> {
    Json(MuteResponse {
        muted: state.monitor.toggle_mute().await,
    })
}

pub async fn alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AnalysisResult>> {
    Json(state.monitor.alert_history().await)
}

pub async fn clear_alerts(State(state): State<Arc<AppState>>) -> StatusCode {
    state.monitor.clear_history().await;
    info!("alert history cleared via API");
    StatusCode::NO_CONTENT
}
