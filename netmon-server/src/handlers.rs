//! Thin HTTP handlers over the store (§6 contract endpoints). Authentication,
//! role checks, and the wider REST surface the UI consumes are out of scope
//! here (SPEC_FULL §3 Non-goals) — these six routes are the ones the core
//! itself is responsible for serving.

use std::time::Duration as StdDuration;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use netmon_core::snmp::{poll_device, poll_pdu, RealSnmpTransport};
use netmon_core::store::models::{AlertEvent, FlowSummary5m, Interface, InterfaceMetric, PduMetric};
use netmon_core::store::ports::{
    AlertEventRepository, DeviceRepository, FlowRepository, InterfaceRepository, MetricsRepository,
    PduRepository,
};
use netmon_model::ids::{AlertEventId, DeviceId};
use netmon_model::{AlertStatus, DeviceType};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAlertEventsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

fn parse_status(raw: &str) -> AppResult<AlertStatus> {
    match raw {
        "open" => Ok(AlertStatus::Open),
        "acknowledged" => Ok(AlertStatus::Acknowledged),
        "resolved" => Ok(AlertStatus::Resolved),
        other => Err(AppError::bad_request(format!("unknown alert status '{other}'"))),
    }
}

/// `GET /api/alerts/events`
pub async fn list_alert_events(
    State(state): State<AppState>,
    Query(query): Query<ListAlertEventsQuery>,
) -> AppResult<Json<Vec<AlertEvent>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let events = state.store.alert_events.list_recent(status, limit).await?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeBody {
    #[serde(default = "default_ack_by")]
    pub by: String,
}

fn default_ack_by() -> String {
    "api".to_string()
}

/// `POST /api/alerts/events/{id}/acknowledge`
pub async fn acknowledge_alert_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<AcknowledgeBody>>,
) -> AppResult<Json<serde_json::Value>> {
    let by = body.map(|Json(b)| b.by).unwrap_or_else(default_ack_by);
    state.store.alert_events.acknowledge(AlertEventId::from(id), &by).await?;
    Ok(Json(serde_json::json!({ "id": id, "status": "acknowledged" })))
}

/// `POST /api/alerts/events/{id}/resolve`
pub async fn resolve_alert_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    state.store.alert_events.resolve(AlertEventId::from(id)).await?;
    Ok(Json(serde_json::json!({ "id": id, "status": "resolved" })))
}

#[derive(Debug, Serialize)]
pub struct WanInterfaceMetrics {
    #[serde(flatten)]
    pub interface: Interface,
    pub latest: Option<InterfaceMetric>,
}

/// `GET /api/interfaces/wan/metrics`
pub async fn wan_interface_metrics(State(state): State<AppState>) -> AppResult<Json<Vec<WanInterfaceMetrics>>> {
    let interfaces = state.store.interfaces.list_wan_interfaces().await?;
    let mut rows = Vec::with_capacity(interfaces.len());
    for interface in interfaces {
        let latest = state.store.metrics.latest_for_interface(interface.id).await?;
        rows.push(WanInterfaceMetrics { interface, latest });
    }
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct PduDashboardRow {
    pub device_id: DeviceId,
    pub hostname: String,
    pub metrics: Vec<PduMetric>,
}

/// `GET /api/pdu/dashboard`
pub async fn pdu_dashboard(State(state): State<AppState>) -> AppResult<Json<Vec<PduDashboardRow>>> {
    let devices = state.store.devices.list_active_by_type(DeviceType::Pdu).await?;
    let device_ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
    let since = Utc::now() - Duration::minutes(15);
    let metrics = state.store.pdu.recent_metrics_for_devices(&device_ids, since).await?;

    let rows = devices
        .into_iter()
        .map(|device| {
            let metrics = metrics
                .iter()
                .filter(|m| m.device_id == device.id)
                .cloned()
                .collect();
            PduDashboardRow { device_id: device.id, hostname: device.hostname, metrics }
        })
        .collect();

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct FlowStatsQuery {
    pub lookback_minutes: Option<i64>,
}

/// `GET /api/flows/stats`. Reuses the rollup aggregation query over a
/// trailing window (§9 design note: no separate TopTalker/ServiceBreakdown
/// schema — out of scope here).
pub async fn flow_stats(
    State(state): State<AppState>,
    Query(query): Query<FlowStatsQuery>,
) -> AppResult<Json<Vec<FlowSummary5m>>> {
    let lookback = query.lookback_minutes.unwrap_or(60).clamp(1, 7 * 24 * 60);
    let window_end = Utc::now();
    let window_start = window_end - Duration::minutes(lookback);
    let summaries = state.store.flows.aggregate_for_rollup(window_start, window_end).await?;
    Ok(Json(summaries))
}

/// `POST /api/devices/{id}/poll`: dispatches an immediate out-of-band SNMP
/// poll, bypassing the scheduler tick.
pub async fn poll_device_now(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let device = state.store.devices.get(DeviceId::from(id)).await?;
    let transport = RealSnmpTransport;
    let timeout: StdDuration = state.snmp_timeout;

    if device.device_type.is_pdu() {
        poll_pdu(&state.store, &transport, &device, timeout).await?;
    } else {
        poll_device(&state.store, &transport, &device, timeout).await?;
    }

    Ok(Json(serde_json::json!({ "device_id": id, "polled": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_accepts_the_three_known_values() {
        assert!(matches!(parse_status("open"), Ok(AlertStatus::Open)));
        assert!(matches!(parse_status("acknowledged"), Ok(AlertStatus::Acknowledged)));
        assert!(matches!(parse_status("resolved"), Ok(AlertStatus::Resolved)));
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        assert!(parse_status("flapping").is_err());
    }

    #[test]
    fn acknowledge_body_defaults_to_api() {
        assert_eq!(default_ack_by(), "api");
    }
}
