//! Instantaneous device/interface alert engine (§4.5). Supports
//! multi-threshold rules (warning + critical in one rule, plus the legacy
//! single-threshold fallback) and rules with no `device_id` that apply to
//! every device.

use chrono::{Duration, Utc};
use netmon_model::{ids::AlertRuleId, AlertMetric, Condition, OperStatus, Severity};
use reqwest::Client;

use crate::alerts::lifecycle::{self, AlertTrigger, RuleRef};
use crate::alerts::notify;
use crate::error::NetmonError;
use crate::store::models::{AlertRule, Device};
use crate::store::ports::{AlertRuleRepository, DeviceRepository, InterfaceRepository, MetricsRepository};
use crate::store::Store;

/// Port-flap window for the GLOSSARY's ">5 changes in 10 minutes" definition.
const FLAP_WINDOW_MINUTES: i64 = 10;
use netmon_config::SmtpConfig;
use netmon_contracts::notify::NotificationEnvelope;

type Result<T> = std::result::Result<T, NetmonError>;

/// Highest severity whose threshold is breached, checking critical before
/// warning before the legacy single-threshold field (§4.5 priority order).
fn evaluate_severity(value: f64, condition: Condition, rule: &AlertRule) -> Option<Severity> {
    if let Some(threshold) = rule.critical_threshold {
        if condition.breached(value, threshold) {
            return Some(Severity::Critical);
        }
    }
    if let Some(threshold) = rule.warning_threshold {
        if condition.breached(value, threshold) {
            return Some(Severity::Warning);
        }
    }
    if let Some(threshold) = rule.threshold {
        if condition.breached(value, threshold) {
            return Some(rule.default_severity);
        }
    }
    None
}

fn breached_threshold(rule: &AlertRule, severity: Severity) -> f64 {
    match severity {
        Severity::Critical if rule.critical_threshold.is_some() => rule.critical_threshold.unwrap(),
        Severity::Warning if rule.warning_threshold.is_some() => rule.warning_threshold.unwrap(),
        _ => rule.threshold.unwrap_or(0.0),
    }
}

fn metric_value_for_device(metric: AlertMetric, device: &Device) -> Option<f64> {
    match metric {
        AlertMetric::DeviceStatus => Some(if device.status == netmon_model::DeviceStatus::Up { 0.0 } else { 1.0 }),
        AlertMetric::CpuUsage => device.cpu_usage,
        AlertMetric::MemoryUsage => device.memory_usage,
        _ => None,
    }
}

/// Current value for a rule with a fixed device/interface target, plus a
/// port-flap count when the metric is `IfStatus` (GLOSSARY: >5 changes in
/// 10 minutes). `None` when the underlying device/metric row doesn't exist
/// yet.
async fn get_metric_value(store: &Store, rule: &AlertRule) -> Result<Option<(f64, Option<i64>)>> {
    if rule.metric.is_device_level() {
        let Some(device_id) = rule.device_id else { return Ok(None) };
        let device = match store.devices.get(device_id).await {
            Ok(device) => device,
            Err(_) => return Ok(None),
        };
        return Ok(metric_value_for_device(rule.metric, &device).map(|v| (v, None)));
    }

    let Some(interface_id) = rule.interface_id else { return Ok(None) };

    if rule.metric == AlertMetric::IfStatus {
        let interface = match store.interfaces.get(interface_id).await {
            Ok(interface) => interface,
            Err(_) => return Ok(None),
        };
        let value = if interface.oper_status == OperStatus::Up { 0.0 } else { 1.0 };
        let since = Utc::now() - Duration::minutes(FLAP_WINDOW_MINUTES);
        let flap_count = store.interfaces.count_recent_state_changes(interface_id, since).await?;
        return Ok(Some((value, Some(flap_count))));
    }

    let Some(latest) = store.metrics.latest_for_interface(interface_id).await? else {
        return Ok(None);
    };

    Ok(match rule.metric {
        AlertMetric::IfUtilizationIn => Some((latest.utilization_in, None)),
        AlertMetric::IfUtilizationOut => Some((latest.utilization_out, None)),
        AlertMetric::IfErrors => Some(((latest.in_errors + latest.out_errors) as f64, None)),
        _ => None,
    })
}

fn format_message(rule: &AlertRule, device_name: &str, value: f64, threshold: f64, flap_count: Option<i64>) -> String {
    let mut message = format!(
        "Alert: {} | Device: {} | Metric: {:?} = {value:.2} {:?} {threshold}",
        rule.name, device_name, rule.metric, rule.condition
    );
    if let Some(count) = flap_count {
        message.push_str(&format!(" | State changes (last {FLAP_WINDOW_MINUTES}m): {count}"));
    }
    message
}

async fn fire_notification(http: &Client, smtp: &SmtpConfig, rule: &AlertRule, event: &crate::store::models::AlertEvent) {
    let envelope = NotificationEnvelope {
        alert_id: event.id,
        rule_name: rule.name.clone(),
        severity: event.severity,
        message: event.message.clone(),
        metric_value: event.metric_value,
        threshold: event.threshold_value,
        timestamp: Utc::now(),
        kind: None,
    };
    notify::dispatch(http, smtp, rule.email_sink.as_deref(), rule.webhook_sink.as_deref(), &envelope).await;
}

/// Evaluates every active device/interface rule once. Global rules (no
/// `device_id`, a device-level metric) are fanned out across every active
/// device; all others evaluate against their single fixed target.
pub async fn evaluate_rules(store: &Store, http: &Client, smtp: &SmtpConfig) -> Result<()> {
    let rules = store.alert_rules.list_active_device_rules().await?;

    for rule in rules {
        if let Err(err) = evaluate_one(store, http, smtp, &rule).await {
            tracing::error!(rule_id = %rule.id, %err, "error evaluating alert rule");
        }
    }

    Ok(())
}

async fn evaluate_one(store: &Store, http: &Client, smtp: &SmtpConfig, rule: &AlertRule) -> Result<()> {
    if rule.device_id.is_none() && rule.metric.is_device_level() {
        for device in store.devices.list_active().await? {
            let Some(value) = metric_value_for_device(rule.metric, &device) else { continue };
            evaluate_and_act(store, http, smtp, rule, value, None, Some(device.id), Some(&device)).await?;
        }
        return Ok(());
    }

    let Some((value, flap_count)) = get_metric_value(store, rule).await? else { return Ok(()) };
    evaluate_and_act(store, http, smtp, rule, value, flap_count, rule.device_id, None).await
}

async fn evaluate_and_act(
    store: &Store,
    http: &Client,
    smtp: &SmtpConfig,
    rule: &AlertRule,
    value: f64,
    flap_count: Option<i64>,
    event_device_id: Option<netmon_model::ids::DeviceId>,
    device: Option<&Device>,
) -> Result<()> {
    let severity = evaluate_severity(value, rule.condition, rule);

    match severity {
        Some(severity) => {
            if severity == Severity::Warning {
                lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), event_device_id, Some(Severity::Critical)).await?;
            } else if severity == Severity::Critical {
                lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), event_device_id, Some(Severity::Warning)).await?;
            }

            let threshold = breached_threshold(rule, severity);
            let device_name = device.map(|d| d.hostname.clone()).unwrap_or_else(|| "Unknown".to_string());
            let message = format_message(rule, &device_name, value, threshold, flap_count);

            let created = lifecycle::trigger(
                &store.alert_events,
                AlertTrigger {
                    rule: RuleRef::Device(rule.id),
                    device_id: event_device_id,
                    severity,
                    message,
                    metric_value: value,
                    threshold_value: threshold,
                },
            )
            .await?;

            if let Some(event) = created {
                tracing::warn!(rule = %rule.name, %severity, "alert triggered");
                fire_notification(http, smtp, rule, &event).await;
            }
        }
        None => {
            lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), event_device_id, None).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmon_model::Condition;

    fn rule(warning: Option<f64>, critical: Option<f64>, threshold: Option<f64>) -> AlertRule {
        AlertRule {
            id: AlertRuleId::new(),
            name: "cpu".into(),
            metric: AlertMetric::CpuUsage,
            condition: Condition::Gt,
            threshold,
            warning_threshold: warning,
            critical_threshold: critical,
            default_severity: Severity::Warning,
            cooldown_minutes: 0,
            device_id: None,
            interface_id: None,
            email_sink: None,
            webhook_sink: None,
            is_active: true,
        }
    }

    #[test]
    fn critical_outranks_warning() {
        let r = rule(Some(70.0), Some(90.0), None);
        assert_eq!(evaluate_severity(95.0, Condition::Gt, &r), Some(Severity::Critical));
        assert_eq!(evaluate_severity(80.0, Condition::Gt, &r), Some(Severity::Warning));
        assert_eq!(evaluate_severity(50.0, Condition::Gt, &r), None);
    }

    #[test]
    fn legacy_threshold_used_when_no_multi_threshold_set() {
        let r = rule(None, None, Some(50.0));
        assert_eq!(evaluate_severity(60.0, Condition::Gt, &r), Some(Severity::Warning));
    }
}
