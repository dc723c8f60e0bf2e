use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub classification_enabled: bool,
    pub active_filters: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterSummary {
    pub name: String,
    pub ip_ranges: usize,
    pub user_agent_markers: usize,
    pub utm_markers: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadOutcome {
    pub active_filters: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        classification_enabled: state.monitor.is_enabled(),
        active_filters: state.monitor.filters().len(),
    })
}

/// Active filters in evaluation order.
pub async fn get_filters(State(state): State<AdminState>) -> Json<Vec<FilterSummary>> {
    let snapshot = state.monitor.filters().snapshot();
    Json(
        snapshot
            .filters()
            .iter()
            .map(|f| FilterSummary {
                name: f.name().to_string(),
                ip_ranges: f.ip_ranges().len(),
                user_agent_markers: f.user_agent_markers().len(),
                utm_markers: f.utm_markers().len(),
            })
            .collect(),
    )
}

pub async fn reload_filters(State(state): State<AdminState>) -> Response {
    let loader = state.loader.clone();
    let store = state.monitor.filters().clone();

    match tokio::task::spawn_blocking(move || loader.reload(&store)).await {
        Ok(Ok(count)) => Json(ReloadOutcome { active_filters: count }).into_response(),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Filter reload task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
