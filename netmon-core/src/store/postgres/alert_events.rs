use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::{
    ids::{AlertEventId, AlertRuleId, DeviceId, PowerAlertRuleId, WanAlertRuleId},
    AlertEventKey, AlertStatus, RuleKind, Severity,
};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::AlertEvent;
use crate::store::ports::AlertEventRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresAlertEventRepository {
    pool: PgPool,
}

impl PostgresAlertEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresAlertEventRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresAlertEventRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "critical" => Severity::Critical,
        _ => Severity::Warning,
    }
}

fn severity_as_str(s: Severity) -> &'static str {
    match s {
        Severity::Warning => "warning",
        Severity::Critical => "critical",
    }
}

fn status_from_str(s: &str) -> AlertStatus {
    match s {
        "acknowledged" => AlertStatus::Acknowledged,
        "resolved" => AlertStatus::Resolved,
        _ => AlertStatus::Open,
    }
}

fn status_as_str(s: AlertStatus) -> &'static str {
    match s {
        AlertStatus::Open => "open",
        AlertStatus::Acknowledged => "acknowledged",
        AlertStatus::Resolved => "resolved",
    }
}

#[derive(sqlx::FromRow)]
struct AlertEventRow {
    id: uuid::Uuid,
    rule_id: Option<uuid::Uuid>,
    wan_rule_id: Option<uuid::Uuid>,
    power_rule_id: Option<uuid::Uuid>,
    device_id: Option<uuid::Uuid>,
    severity: String,
    status: String,
    message: String,
    metric_value: f64,
    threshold_value: f64,
    triggered_at: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
    acknowledged_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

impl From<AlertEventRow> for AlertEvent {
    fn from(row: AlertEventRow) -> Self {
        AlertEvent {
            id: AlertEventId::from(row.id),
            rule_id: row.rule_id.map(AlertRuleId::from),
            wan_rule_id: row.wan_rule_id.map(WanAlertRuleId::from),
            power_rule_id: row.power_rule_id.map(PowerAlertRuleId::from),
            device_id: row.device_id.map(DeviceId::from),
            severity: severity_from_str(&row.severity),
            status: status_from_str(&row.status),
            message: row.message,
            metric_value: row.metric_value,
            threshold_value: row.threshold_value,
            triggered_at: row.triggered_at,
            acknowledged_at: row.acknowledged_at,
            acknowledged_by: row.acknowledged_by,
            resolved_at: row.resolved_at,
            notes: row.notes,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, rule_id, wan_rule_id, power_rule_id, device_id, severity, status,
    message, metric_value, threshold_value, triggered_at, acknowledged_at,
    acknowledged_by, resolved_at, notes
"#;

#[async_trait]
impl AlertEventRepository for PostgresAlertEventRepository {
    async fn find_active(&self, key: &AlertEventKey) -> Result<Option<AlertEvent>> {
        let rule_column = match key.rule_kind {
            RuleKind::Device => "rule_id",
            RuleKind::Wan => "wan_rule_id",
            RuleKind::Power => "power_rule_id",
        };

        let row = sqlx::query_as::<_, AlertEventRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM alert_events
            WHERE {rule_column} = $1
              AND device_id IS NOT DISTINCT FROM $2
              AND severity = $3
              AND status IN ('open', 'acknowledged')
            ORDER BY triggered_at DESC
            LIMIT 1
            "#
        ))
        .bind(key.rule_id)
        .bind(key.device_id.map(|id| id.as_uuid()))
        .bind(severity_as_str(key.severity))
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&self, event: &AlertEvent) -> Result<AlertEventId> {
        let id: uuid::Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO alert_events (
                id, rule_id, wan_rule_id, power_rule_id, device_id, severity,
                status, message, metric_value, threshold_value, triggered_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.rule_id.map(|id| id.as_uuid()))
        .bind(event.wan_rule_id.map(|id| id.as_uuid()))
        .bind(event.power_rule_id.map(|id| id.as_uuid()))
        .bind(event.device_id.map(|id| id.as_uuid()))
        .bind(severity_as_str(event.severity))
        .bind(status_as_str(event.status))
        .bind(&event.message)
        .bind(event.metric_value)
        .bind(event.threshold_value)
        .bind(event.triggered_at)
        .fetch_one(self.pool())
        .await?;

        Ok(AlertEventId::from(id))
    }

    async fn update_values(
        &self,
        id: AlertEventId,
        metric_value: f64,
        threshold_value: f64,
        message: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE alert_events SET metric_value = $2, threshold_value = $3, message = $4 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(metric_value)
        .bind(threshold_value)
        .bind(message)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn auto_resolve(&self, id: AlertEventId) -> Result<()> {
        sqlx::query(
            "UPDATE alert_events SET status = 'resolved', resolved_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn acknowledge(&self, id: AlertEventId, by: &str) -> Result<()> {
        sqlx::query(
            "UPDATE alert_events SET status = 'acknowledged', acknowledged_at = NOW(), acknowledged_by = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(by)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn resolve(&self, id: AlertEventId) -> Result<()> {
        sqlx::query("UPDATE alert_events SET status = 'resolved', resolved_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    async fn list_open(&self, rule_id: uuid::Uuid, device_id: Option<DeviceId>) -> Result<Vec<AlertEvent>> {
        let rows = sqlx::query_as::<_, AlertEventRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM alert_events
            WHERE (rule_id = $1 OR wan_rule_id = $1 OR power_rule_id = $1)
              AND device_id IS NOT DISTINCT FROM $2
              AND status IN ('open', 'acknowledged')
            ORDER BY triggered_at DESC
            "#
        ))
        .bind(rule_id)
        .bind(device_id.map(|id| id.as_uuid()))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_recent(&self, status: Option<AlertStatus>, limit: i64) -> Result<Vec<AlertEvent>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, AlertEventRow>(&format!(
                    r#"
                    SELECT {SELECT_COLUMNS}
                    FROM alert_events
                    WHERE status = $1
                    ORDER BY triggered_at DESC
                    LIMIT $2
                    "#
                ))
                .bind(status_as_str(status))
                .bind(limit)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, AlertEventRow>(&format!(
                    r#"
                    SELECT {SELECT_COLUMNS}
                    FROM alert_events
                    ORDER BY triggered_at DESC
                    LIMIT $1
                    "#
                ))
                .bind(limit)
                .fetch_all(self.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
