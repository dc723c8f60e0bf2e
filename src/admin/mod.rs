//! Admin API: status, active filters, manual reload.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::filters::FilterLoader;
use crate::monitor::TrafficMonitor;

#[derive(Clone)]
pub struct AdminState {
    pub monitor: Arc<TrafficMonitor>,
    pub loader: FilterLoader,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/filters", get(get_filters))
        .route("/admin/filters/reload", post(reload_filters))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
