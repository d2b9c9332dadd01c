//! WAN aggregate alert engine (§4.5.1). Buckets WAN interface throughput to
//! minute resolution over a rule's lookback window, derives p95/max/avg and
//! commitment usage, and evaluates every rule sharing that window against
//! one cached aggregate.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, Utc};
use netmon_model::{aggregate::WanMetric, Severity};
use reqwest::Client;

use crate::alerts::lifecycle::{self, AlertTrigger, RuleRef};
use crate::alerts::notify;
use crate::alerts::percentile::percentile_95;
use crate::error::NetmonError;
use crate::store::models::WanAlertRule;
use crate::store::ports::{AlertRuleRepository, InterfaceRepository, MetricsRepository, SettingsRepository};
use crate::store::Store;
use netmon_config::SmtpConfig;
use netmon_contracts::notify::NotificationEnvelope;

type Result<T> = std::result::Result<T, NetmonError>;

const SETTING_COMMITMENT_BPS: &str = "wan_commitment_bps";

#[derive(Debug, Clone, Copy, Default)]
pub struct WanAggregates {
    pub p95_in: f64,
    pub p95_out: f64,
    pub p95_max: f64,
    pub max_in: f64,
    pub max_out: f64,
    pub avg_in: f64,
    pub avg_out: f64,
    pub commitment_pct: f64,
}

impl WanAggregates {
    fn value(&self, metric: WanMetric) -> f64 {
        match metric {
            WanMetric::P95In => self.p95_in,
            WanMetric::P95Out => self.p95_out,
            WanMetric::P95Max => self.p95_max,
            WanMetric::MaxIn => self.max_in,
            WanMetric::MaxOut => self.max_out,
            WanMetric::AvgIn => self.avg_in,
            WanMetric::AvgOut => self.avg_out,
            WanMetric::CommitmentPct => self.commitment_pct,
        }
    }
}

/// Sums in/out throughput of every WAN interface into one-minute buckets
/// over the trailing `lookback_minutes`, then reduces those buckets to the
/// aggregate values the rules evaluate against. Returns `None` when there
/// are no WAN interfaces or no metrics in the window (mirrors the
/// original short-circuiting on an empty aggregate dict).
pub async fn compute_wan_aggregates(store: &Store, lookback_minutes: i64) -> Result<Option<WanAggregates>> {
    let wan_ifaces = store.interfaces.list_wan_interfaces().await?;
    if wan_ifaces.is_empty() {
        return Ok(None);
    }

    let ids: Vec<_> = wan_ifaces.iter().map(|i| i.id).collect();
    let since = Utc::now() - Duration::minutes(lookback_minutes);
    let metrics = store.metrics.recent_for_interfaces(&ids, since).await?;
    if metrics.is_empty() {
        return Ok(None);
    }

    let mut buckets: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for m in &metrics {
        let minute = (m.timestamp.timestamp() / 60) * 60;
        let entry = buckets.entry(minute).or_insert((0.0, 0.0));
        entry.0 += m.in_bps;
        entry.1 += m.out_bps;
    }

    let all_in: Vec<f64> = buckets.values().map(|(i, _)| *i).collect();
    let all_out: Vec<f64> = buckets.values().map(|(_, o)| *o).collect();

    let p95_in = percentile_95(&all_in);
    let p95_out = percentile_95(&all_out);
    let p95_max = p95_in.max(p95_out);
    let max_in = all_in.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let max_out = all_out.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg_in = all_in.iter().sum::<f64>() / all_in.len() as f64;
    let avg_out = all_out.iter().sum::<f64>() / all_out.len() as f64;

    let commitment_pct = match store.settings.get_f64(SETTING_COMMITMENT_BPS).await? {
        Some(commitment_bps) if commitment_bps > 0.0 => (p95_max / commitment_bps) * 100.0,
        _ => 0.0,
    };

    Ok(Some(WanAggregates {
        p95_in,
        p95_out,
        p95_max,
        max_in,
        max_out,
        avg_in,
        avg_out,
        commitment_pct,
    }))
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

fn format_value(metric: WanMetric, value: f64) -> String {
    if matches!(metric, WanMetric::CommitmentPct) {
        return format!("{value:.1}%");
    }
    if value >= 1_000_000_000.0 {
        format!("{:.2} Gbps", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2} Mbps", value / 1_000_000.0)
    } else {
        format!("{value:.0} bps")
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

fn metric_label(metric: WanMetric) -> &'static str {
    match metric {
        WanMetric::P95In => "95th Percentile In",
        WanMetric::P95Out => "95th Percentile Out",
        WanMetric::P95Max => "95th Percentile Max",
        WanMetric::MaxIn => "Max In",
        WanMetric::MaxOut => "Max Out",
        WanMetric::AvgIn => "Average In",
        WanMetric::AvgOut => "Average Out",
        WanMetric::CommitmentPct => "Commitment %",
    }
}

fn evaluate_severity(value: f64, rule: &WanAlertRule) -> Option<Severity> {
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

fn breached_threshold(rule: &WanAlertRule, severity: Severity) -> f64 {
    match severity {
        Severity::Critical => rule.critical_threshold.unwrap_or(0.0),
        Severity::Warning => rule.warning_threshold.unwrap_or(0.0),
    }
}

async fn fire_notification(http: &Client, smtp: &SmtpConfig, rule: &WanAlertRule, event: &crate::store::models::AlertEvent) {
    let envelope = NotificationEnvelope {
        alert_id: event.id,
        rule_name: rule.name.clone(),
        severity: event.severity,
        message: event.message.clone(),
        metric_value: event.metric_value,
        threshold: event.threshold_value,
        timestamp: Utc::now(),
        kind: Some("wan_aggregate"),
    };
    notify::dispatch(http, smtp, rule.email_sink.as_deref(), rule.webhook_sink.as_deref(), &envelope).await;
}

/// Evaluates every active WAN rule, grouping by `lookback_minutes` so
/// rules sharing a window only trigger one aggregate computation.
pub async fn evaluate_rules(store: &Store, http: &Client, smtp: &SmtpConfig) -> Result<()> {
    let rules = store.alert_rules.list_active_wan_rules().await?;
    if rules.is_empty() {
        return Ok(());
    }

    let mut groups: HashMap<i64, Vec<WanAlertRule>> = HashMap::new();
    for rule in rules {
        groups.entry(rule.lookback_minutes).or_default().push(rule);
    }

    let mut cache: HashMap<i64, Option<WanAggregates>> = HashMap::new();

    for (lookback, group_rules) in groups {
        let agg = match cache.entry(lookback) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let computed = compute_wan_aggregates(store, lookback).await?;
                *e.insert(computed)
            }
        };

        let Some(agg) = agg else { continue };

        for rule in &group_rules {
            if let Err(err) = evaluate_one(store, http, smtp, rule, &agg).await {
                tracing::error!(rule_id = %rule.id, %err, "error evaluating WAN rule");
            }
        }
    }

    Ok(())
}

async fn evaluate_one(store: &Store, http: &Client, smtp: &SmtpConfig, rule: &WanAlertRule, agg: &WanAggregates) -> Result<()> {
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
                "WAN Alert: {} | {} ({}) = {} {} {}",
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
                    rule: RuleRef::Wan(rule.id),
                    device_id: None,
                    severity,
                    message,
                    metric_value: value,
                    threshold_value: threshold,
                },
            )
            .await?;

            if let Some(event) = created {
                tracing::warn!(rule = %rule.name, %severity, "WAN alert triggered");
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
    fn p95_max_is_larger_of_the_two_directions() {
        let agg = WanAggregates { p95_in: 500.0, p95_out: 900.0, p95_max: 900.0, ..Default::default() };
        assert_eq!(agg.value(WanMetric::P95Max), 900.0);
    }
}
