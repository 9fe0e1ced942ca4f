mod audit;
mod groups;
mod health;
mod pagination;
mod selectors;
mod state;

pub use state::AdminState;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::infra::assets;

use super::middleware::trace_requests;

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/requests/{id}/audit", get(audit::audit_log_page))
        .route("/requests/{id}/audit/stream", get(audit::audit_log_stream))
        .route("/requests/{id}/audit/panel", get(audit::audit_log_panel))
        .route("/groups", get(groups::admin_groups))
        .route("/groups/panel", post(groups::admin_groups_panel))
        .route("/_health", get(health::admin_health))
        .route("/static/admin/{*path}", get(assets::serve_admin))
        .with_state(state)
        .layer(middleware::from_fn(trace_requests))
}
