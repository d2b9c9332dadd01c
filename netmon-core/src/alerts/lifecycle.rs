//! Upsert-or-update / auto-resolve lifecycle shared by the device,
//! WAN-aggregate, and power-aggregate engines (§4.5, §4.5.1, §4.5.2).
//! Each engine only needs to compute a value and a severity; this module
//! owns the "at most one active event per (rule, severity, device)"
//! invariant from §3.

use chrono::Utc;
use netmon_model::{
    ids::{AlertEventId, AlertRuleId, DeviceId, PowerAlertRuleId, WanAlertRuleId},
    AlertEventKey, AlertStatus, RuleKind, Severity,
};

use crate::error::StoreError;
use crate::store::models::AlertEvent;
use crate::store::ports::AlertEventRepository;

type Result<T> = std::result::Result<T, StoreError>;

/// The rule a triggered event belongs to, carrying its typed id so
/// [`trigger`] can stamp the correct foreign key on a new [`AlertEvent`]
/// (§3 invariant: exactly one of rule_id/wan_rule_id/power_rule_id is set).
#[derive(Debug, Clone, Copy)]
pub enum RuleRef {
    Device(AlertRuleId),
    Wan(WanAlertRuleId),
    Power(PowerAlertRuleId),
}

impl RuleRef {
    fn kind(self) -> RuleKind {
        match self {
            RuleRef::Device(_) => RuleKind::Device,
            RuleRef::Wan(_) => RuleKind::Wan,
            RuleRef::Power(_) => RuleKind::Power,
        }
    }

    fn as_uuid(self) -> uuid::Uuid {
        match self {
            RuleRef::Device(id) => id.as_uuid(),
            RuleRef::Wan(id) => id.as_uuid(),
            RuleRef::Power(id) => id.as_uuid(),
        }
    }
}

pub struct AlertTrigger {
    pub rule: RuleRef,
    pub device_id: Option<DeviceId>,
    pub severity: Severity,
    pub message: String,
    pub metric_value: f64,
    pub threshold_value: f64,
}

/// Creates a new event on first breach, or refreshes the value/message of
/// the already-open one. Returns the event only when it was just created —
/// callers fire notifications on `Some`, stay silent on `None` (§4.6:
/// notifications go out on first occurrence, never on an update).
pub async fn trigger<R: AlertEventRepository>(events: &R, t: AlertTrigger) -> Result<Option<AlertEvent>> {
    let key = AlertEventKey {
        rule_kind: t.rule.kind(),
        rule_id: t.rule.as_uuid(),
        device_id: t.device_id,
        severity: t.severity,
    };

    if let Some(existing) = events.find_active(&key).await? {
        events
            .update_values(existing.id, t.metric_value, t.threshold_value, &t.message)
            .await?;
        return Ok(None);
    }

    let mut event = AlertEvent {
        id: AlertEventId::new(),
        rule_id: None,
        wan_rule_id: None,
        power_rule_id: None,
        device_id: t.device_id,
        severity: t.severity,
        status: AlertStatus::Open,
        message: t.message,
        metric_value: t.metric_value,
        threshold_value: t.threshold_value,
        triggered_at: Utc::now(),
        acknowledged_at: None,
        acknowledged_by: None,
        resolved_at: None,
        notes: None,
    };

    match t.rule {
        RuleRef::Device(id) => event.rule_id = Some(id),
        RuleRef::Wan(id) => event.wan_rule_id = Some(id),
        RuleRef::Power(id) => event.power_rule_id = Some(id),
    }

    let id = events.insert(&event).await?;
    event.id = id;

    Ok(Some(event))
}

/// Auto-resolves open (not acknowledged — an operator already looking at
/// it isn't silently overridden) events for a rule, optionally narrowed to
/// one severity and/or one device.
pub async fn resolve<R: AlertEventRepository>(
    events: &R,
    rule_id: uuid::Uuid,
    device_id: Option<DeviceId>,
    severity: Option<Severity>,
) -> Result<()> {
    let open = events.list_open(rule_id, device_id).await?;

    for event in open {
        if event.status != AlertStatus::Open {
            continue;
        }
        if let Some(sev) = severity {
            if event.severity != sev {
                continue;
            }
        }
        events.auto_resolve(event.id).await?;
    }

    Ok(())
}
