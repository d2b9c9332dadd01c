use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// The §6 contract endpoints, as thin handlers over the store. Everything
/// else the UI consumes (auth, roles, the rest of `/api`) is out of scope
/// here (SPEC_FULL §3 Non-goals).
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/alerts/events", get(handlers::list_alert_events))
        .route(
            "/api/alerts/events/{id}/acknowledge",
            post(handlers::acknowledge_alert_event),
        )
        .route("/api/alerts/events/{id}/resolve", post(handlers::resolve_alert_event))
        .route("/api/interfaces/wan/metrics", get(handlers::wan_interface_metrics))
        .route("/api/pdu/dashboard", get(handlers::pdu_dashboard))
        .route("/api/flows/stats", get(handlers::flow_stats))
        .route("/api/devices/{id}/poll", post(handlers::poll_device_now))
        .with_state(state)
}
