//! Power aggregate alert engine (§4.5.2). Mirrors [`crate::alerts::wan`]
//! but aggregates [`PduMetric`](crate::store::models::PduMetric) rows
//! across active PDU devices instead of WAN interface counters.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use netmon_model::{aggregate::PowerMetric, DeviceType, Severity};
use reqwest::Client;

use crate::alerts::lifecycle::{self, AlertTrigger, RuleRef};
use crate::alerts::notify;
use crate::error::NetmonError;
use crate::store::models::PowerAlertRule;
use crate::store::ports::{AlertRuleRepository, DeviceRepository, PduRepository, SettingsRepository};
use crate::store::Store;
use netmon_config::SmtpConfig;
use netmon_contracts::notify::NotificationEnvelope;

type Result<T> = std::result::Result<T, NetmonError>;

const SETTING_POWER_BUDGET_WATTS: &str = "power_budget_watts";

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerAggregates {
    pub total_power: f64,
    pub avg_load: f64,
    pub max_load: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
    pub budget_pct: f64,
}

impl PowerAggregates {
    fn value(&self, metric: PowerMetric) -> f64 {
        match metric {
            PowerMetric::TotalPower => self.total_power,
            PowerMetric::AvgLoad => self.avg_load,
            PowerMetric::MaxLoad => self.max_load,
            PowerMetric::MaxTemp => self.max_temp,
            PowerMetric::AvgTemp => self.avg_temp,
            PowerMetric::BudgetPct => self.budget_pct,
        }
    }
}

/// Buckets total power draw by minute across every active PDU device and
/// reduces load/temperature readings to their min/avg/max. `total_power`
/// is the most recent bucket's sum, matching the reference's
/// "latest bucket is the current aggregate" semantics.
pub async fn compute_power_aggregates(store: &Store, lookback_minutes: i64) -> Result<Option<PowerAggregates>> {
    let pdus = store.devices.list_active_by_type(DeviceType::Pdu).await?;
    if pdus.is_empty() {
        return Ok(None);
    }

    let ids: Vec<_> = pdus.iter().map(|d| d.id).collect();
    let since = Utc::now() - Duration::minutes(lookback_minutes);
    let mut metrics = store.pdu.recent_metrics_for_devices(&ids, since).await?;
    if metrics.is_empty() {
        return Ok(None);
    }
    metrics.sort_by_key(|m| m.timestamp);

    let mut buckets: Vec<(i64, f64)> = Vec::new();
    let mut load_values = Vec::new();
    let mut temp_values = Vec::new();

    for m in &metrics {
        let minute = (m.timestamp.timestamp() / 60) * 60;
        match buckets.last_mut() {
            Some((bucket, power)) if *bucket == minute => *power += m.total_power_watts,
            _ => buckets.push((minute, m.total_power_watts)),
        }

        if let Some(load) = m.load_pct {
            load_values.push(load);
        }
        if let Some(temp) = m.temperature_c {
            temp_values.push(temp);
        }
    }

    let total_power = buckets.last().map(|(_, p)| *p).unwrap_or(0.0);
    let avg_load = if load_values.is_empty() { 0.0 } else { load_values.iter().sum::<f64>() / load_values.len() as f64 };
    let max_load = load_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let max_load = if max_load.is_finite() { max_load } else { 0.0 };
    let avg_temp = if temp_values.is_empty() { 0.0 } else { temp_values.iter().sum::<f64>() / temp_values.len() as f64 };
    let max_temp = temp_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let max_temp = if max_temp.is_finite() { max_temp } else { 0.0 };

    let budget_pct = match store.settings.get_f64(SETTING_POWER_BUDGET_WATTS).await? {
        Some(budget_watts) if budget_watts > 0.0 => (total_power / budget_watts) * 100.0,
        _ => 0.0,
    };

    Ok(Some(PowerAggregates { total_power, avg_load, max_load, max_temp, avg_temp, budget_pct }))
}

fn format_lookback(minutes: i64) -> String {
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 1440 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / 1440)
    }
}

fn format_value(metric: PowerMetric, value: f64) -> String {
    match metric {
        PowerMetric::TotalPower if value >= 1000.0 => format!("{:.2} kW", value / 1000.0),
        PowerMetric::TotalPower => format!("{value:.0} W"),
        PowerMetric::AvgLoad | PowerMetric::MaxLoad | PowerMetric::BudgetPct => format!("{value:.1}%"),
        PowerMetric::MaxTemp | PowerMetric::AvgTemp => format!("{value:.1}\u{b0}C"),
    }
}

fn metric_label(metric: PowerMetric) -> &'static str {
    match metric {
        PowerMetric::TotalPower => "Total Power",
        PowerMetric::AvgLoad => "Avg Load",
        PowerMetric::MaxLoad => "Max Load",
        PowerMetric::MaxTemp => "Max Temperature",
        PowerMetric::AvgTemp => "Avg Temperature",
        PowerMetric::BudgetPct => "Budget %",
    }
}

fn condition_label(condition: netmon_model::Condition) -> &'static str {
    match condition {
        netmon_model::Condition::Gt => "gt",
        netmon_model::Condition::Gte => "gte",
        netmon_model::Condition::Lt => "lt",
        netmon_model::Condition::Lte => "lte",
        netmon_model::Condition::Eq => "eq",
        netmon_model::Condition::Ne => "ne",
    }
}

fn evaluate_severity(value: f64, rule: &PowerAlertRule) -> Option<Severity> {
    if let Some(t) = rule.critical_threshold {
        if rule.condition.breached(value, t) {
            return Some(Severity::Critical);
        }
    }
    if let Some(t) = rule.warning_threshold {
        if rule.condition.breached(value, t) {
            return Some(Severity::Warning);
        }
    }
    None
}

fn breached_threshold(rule: &PowerAlertRule, severity: Severity) -> f64 {
    match severity {
        Severity::Critical => rule.critical_threshold.unwrap_or(0.0),
        Severity::Warning => rule.warning_threshold.unwrap_or(0.0),
    }
}

async fn fire_notification(http: &Client, smtp: &SmtpConfig, rule: &PowerAlertRule, event: &crate::store::models::AlertEvent) {
    let envelope = NotificationEnvelope {
        alert_id: event.id,
        rule_name: rule.name.clone(),
        severity: event.severity,
        message: event.message.clone(),
        metric_value: event.metric_value,
        threshold: event.threshold_value,
        timestamp: Utc::now(),
        kind: Some("power_aggregate"),
    };
    notify::dispatch(http, smtp, rule.email_sink.as_deref(), rule.webhook_sink.as_deref(), &envelope).await;
}

/// Evaluates every active power rule, grouping by `lookback_minutes` so
/// rules sharing a window only trigger one aggregate computation.
pub async fn evaluate_rules(store: &Store, http: &Client, smtp: &SmtpConfig) -> Result<()> {
    let rules = store.alert_rules.list_active_power_rules().await?;
    if rules.is_empty() {
        return Ok(());
    }

    let mut groups: HashMap<i64, Vec<PowerAlertRule>> = HashMap::new();
    for rule in rules {
        groups.entry(rule.lookback_minutes).or_default().push(rule);
    }

    let mut cache: HashMap<i64, Option<PowerAggregates>> = HashMap::new();

    for (lookback, group_rules) in groups {
        let agg = match cache.entry(lookback) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let computed = compute_power_aggregates(store, lookback).await?;
                *e.insert(computed)
            }
        };

        let Some(agg) = agg else { continue };

        for rule in &group_rules {
            if let Err(err) = evaluate_one(store, http, smtp, rule, &agg).await {
                tracing::error!(rule_id = %rule.id, %err, "error evaluating power rule");
            }
        }
    }

    Ok(())
}

async fn evaluate_one(store: &Store, http: &Client, smtp: &SmtpConfig, rule: &PowerAlertRule, agg: &PowerAggregates) -> Result<()> {
    let value = agg.value(rule.metric);
    let severity = evaluate_severity(value, rule);

    match severity {
        Some(severity) => {
            if severity == Severity::Warning {
                lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), None, Some(Severity::Critical)).await?;
            } else if severity == Severity::Critical {
                lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), None, Some(Severity::Warning)).await?;
            }

            let threshold = breached_threshold(rule, severity);
            let message = format!(
                "Power Alert: {} | {} ({}) = {} {} {}",
                rule.name,
                metric_label(rule.metric),
                format_lookback(rule.lookback_minutes),
                format_value(rule.metric, value),
                condition_label(rule.condition),
                format_value(rule.metric, threshold),
            );

            let created = lifecycle::trigger(
                &store.alert_events,
                AlertTrigger {
                    rule: RuleRef::Power(rule.id),
                    device_id: None,
                    severity,
                    message,
                    metric_value: value,
                    threshold_value: threshold,
                },
            )
            .await?;

            if let Some(event) = created {
                tracing::warn!(rule = %rule.name, %severity, "power alert triggered");
                fire_notification(http, smtp, rule, &event).await;
            }
        }
        None => {
            lifecycle::resolve(&store.alert_events, rule.id.as_uuid(), None, None).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_power_formats_as_kilowatts_above_one_thousand() {
        assert_eq!(format_value(PowerMetric::TotalPower, 1500.0), "1.50 kW");
        assert_eq!(format_value(PowerMetric::TotalPower, 400.0), "400 W");
    }
}
