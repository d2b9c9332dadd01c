//! Notification sinks fired by the alert engines on first transition into
//! an active severity (§4.6). Both are fire-and-forget: failure is logged,
//! never retried, and never blocks the evaluation tick that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::{ids::AlertEventId, Severity};
use serde::Serialize;

/// JSON envelope posted to webhook sinks; `kind` is only populated by the
/// aggregate engines (§4.6: "type set for aggregate engines").
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEnvelope {
    pub alert_id: AlertEventId,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    pub metric_value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("sink not configured")]
    NotConfigured,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError>;
}
