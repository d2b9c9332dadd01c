use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use netmon_model::{
    aggregate::{PowerMetric, WanMetric},
    ids::{AlertRuleId, DeviceId, InterfaceId, PowerAlertRuleId, WanAlertRuleId},
    AlertMetric, Condition, Severity,
};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{AlertRule, PowerAlertRule, WanAlertRule};
use crate::store::ports::AlertRuleRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresAlertRuleRepository {
    pool: PgPool,
}

impl PostgresAlertRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresAlertRuleRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresAlertRuleRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn alert_metric_from_str(s: &str) -> Option<AlertMetric> {
    Some(match s {
        "device_status" => AlertMetric::DeviceStatus,
        "cpu_usage" => AlertMetric::CpuUsage,
        "memory_usage" => AlertMetric::MemoryUsage,
        "if_utilization_in" => AlertMetric::IfUtilizationIn,
        "if_utilization_out" => AlertMetric::IfUtilizationOut,
        "if_status" => AlertMetric::IfStatus,
        "if_errors" => AlertMetric::IfErrors,
        _ => return None,
    })
}

fn condition_from_str(s: &str) -> Option<Condition> {
    Some(match s {
        "gt" => Condition::Gt,
        "gte" => Condition::Gte,
        "lt" => Condition::Lt,
        "lte" => Condition::Lte,
        "eq" => Condition::Eq,
        "ne" => Condition::Ne,
        _ => return None,
    })
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "critical" => Severity::Critical,
        _ => Severity::Warning,
    }
}

#[derive(sqlx::FromRow)]
struct AlertRuleRow {
    id: uuid::Uuid,
    name: String,
    metric: String,
    condition: String,
    threshold: Option<f64>,
    warning_threshold: Option<f64>,
    critical_threshold: Option<f64>,
    default_severity: String,
    cooldown_minutes: i32,
    device_id: Option<uuid::Uuid>,
    interface_id: Option<uuid::Uuid>,
    email_sink: Option<String>,
    webhook_sink: Option<String>,
    is_active: bool,
}

impl TryFrom<AlertRuleRow> for AlertRule {
    type Error = StoreError;

    fn try_from(row: AlertRuleRow) -> std::result::Result<Self, Self::Error> {
        let metric = alert_metric_from_str(&row.metric)
            .ok_or_else(|| StoreError::InvalidRule(format!("unknown alert metric: {}", row.metric)))?;
        let condition = condition_from_str(&row.condition)
            .ok_or_else(|| StoreError::InvalidRule(format!("unknown condition: {}", row.condition)))?;

        Ok(AlertRule {
            id: AlertRuleId::from(row.id),
            name: row.name,
            metric,
            condition,
            threshold: row.threshold,
            warning_threshold: row.warning_threshold,
            critical_threshold: row.critical_threshold,
            default_severity: severity_from_str(&row.default_severity),
            cooldown_minutes: row.cooldown_minutes,
            device_id: row.device_id.map(DeviceId::from),
            interface_id: row.interface_id.map(InterfaceId::from),
            email_sink: row.email_sink,
            webhook_sink: row.webhook_sink,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WanAlertRuleRow {
    id: uuid::Uuid,
    name: String,
    metric: String,
    condition: String,
    lookback_minutes: i64,
    warning_threshold: Option<f64>,
    critical_threshold: Option<f64>,
    email_sink: Option<String>,
    webhook_sink: Option<String>,
    is_active: bool,
}

impl TryFrom<WanAlertRuleRow> for WanAlertRule {
    type Error = StoreError;

    fn try_from(row: WanAlertRuleRow) -> std::result::Result<Self, Self::Error> {
        let metric = WanMetric::from_str(&row.metric)
            .map_err(StoreError::InvalidRule)?;
        let condition = condition_from_str(&row.condition)
            .ok_or_else(|| StoreError::InvalidRule(format!("unknown condition: {}", row.condition)))?;

        Ok(WanAlertRule {
            id: WanAlertRuleId::from(row.id),
            name: row.name,
            metric,
            condition,
            lookback_minutes: row.lookback_minutes,
            warning_threshold: row.warning_threshold,
            critical_threshold: row.critical_threshold,
            email_sink: row.email_sink,
            webhook_sink: row.webhook_sink,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PowerAlertRuleRow {
    id: uuid::Uuid,
    name: String,
    metric: String,
    condition: String,
    lookback_minutes: i64,
    warning_threshold: Option<f64>,
    critical_threshold: Option<f64>,
    email_sink: Option<String>,
    webhook_sink: Option<String>,
    is_active: bool,
}

impl TryFrom<PowerAlertRuleRow> for PowerAlertRule {
    type Error = StoreError;

    fn try_from(row: PowerAlertRuleRow) -> std::result::Result<Self, Self::Error> {
        let metric = PowerMetric::from_str(&row.metric)
            .map_err(StoreError::InvalidRule)?;
        let condition = condition_from_str(&row.condition)
            .ok_or_else(|| StoreError::InvalidRule(format!("unknown condition: {}", row.condition)))?;

        Ok(PowerAlertRule {
            id: PowerAlertRuleId::from(row.id),
            name: row.name,
            metric,
            condition,
            lookback_minutes: row.lookback_minutes,
            warning_threshold: row.warning_threshold,
            critical_threshold: row.critical_threshold,
            email_sink: row.email_sink,
            webhook_sink: row.webhook_sink,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl AlertRuleRepository for PostgresAlertRuleRepository {
    async fn list_active_device_rules(&self) -> Result<Vec<AlertRule>> {
        let rows = sqlx::query_as::<_, AlertRuleRow>(
            r#"
            SELECT id, name, metric, condition, threshold, warning_threshold,
                   critical_threshold, default_severity, cooldown_minutes,
                   device_id, interface_id, email_sink, webhook_sink, is_active
            FROM alert_rules
            WHERE is_active
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryFrom::try_from).collect()
    }

    async fn list_active_wan_rules(&self) -> Result<Vec<WanAlertRule>> {
        let rows = sqlx::query_as::<_, WanAlertRuleRow>(
            r#"
            SELECT id, name, metric, condition, lookback_minutes, warning_threshold,
                   critical_threshold, email_sink, webhook_sink, is_active
            FROM wan_alert_rules
            WHERE is_active
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryFrom::try_from).collect()
    }

    async fn list_active_power_rules(&self) -> Result<Vec<PowerAlertRule>> {
        let rows = sqlx::query_as::<_, PowerAlertRuleRow>(
            r#"
            SELECT id, name, metric, condition, lookback_minutes, warning_threshold,
                   critical_threshold, email_sink, webhook_sink, is_active
            FROM power_alert_rules
            WHERE is_active
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryFrom::try_from).collect()
    }
}
