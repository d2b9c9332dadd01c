use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::ids::InterfaceId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::InterfaceMetric;
use crate::store::ports::MetricsRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresMetricsRepository {
    pool: PgPool,
}

impl PostgresMetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresMetricsRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresMetricsRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct InterfaceMetricRow {
    interface_id: uuid::Uuid,
    timestamp: DateTime<Utc>,
    in_octets: i64,
    out_octets: i64,
    in_packets: i64,
    out_packets: i64,
    in_errors: i64,
    out_errors: i64,
    in_discards: i64,
    out_discards: i64,
    in_broadcast: i64,
    in_multicast: i64,
    in_bps: f64,
    out_bps: f64,
    utilization_in: f64,
    utilization_out: f64,
    pps: f64,
}

impl From<InterfaceMetricRow> for InterfaceMetric {
    fn from(row: InterfaceMetricRow) -> Self {
        InterfaceMetric {
            interface_id: InterfaceId::from(row.interface_id),
            timestamp: row.timestamp,
            in_octets: row.in_octets as u64,
            out_octets: row.out_octets as u64,
            in_packets: row.in_packets as u64,
            out_packets: row.out_packets as u64,
            in_errors: row.in_errors as u64,
            out_errors: row.out_errors as u64,
            in_discards: row.in_discards as u64,
            out_discards: row.out_discards as u64,
            in_broadcast: row.in_broadcast as u64,
            in_multicast: row.in_multicast as u64,
            in_bps: row.in_bps,
            out_bps: row.out_bps,
            utilization_in: row.utilization_in,
            utilization_out: row.utilization_out,
            pps: row.pps,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    interface_id, timestamp, in_octets, out_octets, in_packets, out_packets,
    in_errors, out_errors, in_discards, out_discards, in_broadcast,
    in_multicast, in_bps, out_bps, utilization_in, utilization_out, pps
"#;

#[async_trait]
impl MetricsRepository for PostgresMetricsRepository {
    async fn latest_for_interface(&self, interface_id: InterfaceId) -> Result<Option<InterfaceMetric>> {
        let row = sqlx::query_as::<_, InterfaceMetricRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interface_metrics WHERE interface_id = $1 ORDER BY timestamp DESC LIMIT 1"
        ))
        .bind(interface_id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert(&self, metric: &InterfaceMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interface_metrics (
                interface_id, timestamp, in_octets, out_octets, in_packets,
                out_packets, in_errors, out_errors, in_discards, out_discards,
                in_broadcast, in_multicast, in_bps, out_bps, utilization_in,
                utilization_out, pps
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(metric.interface_id.as_uuid())
        .bind(metric.timestamp)
        .bind(metric.in_octets as i64)
        .bind(metric.out_octets as i64)
        .bind(metric.in_packets as i64)
        .bind(metric.out_packets as i64)
        .bind(metric.in_errors as i64)
        .bind(metric.out_errors as i64)
        .bind(metric.in_discards as i64)
        .bind(metric.out_discards as i64)
        .bind(metric.in_broadcast as i64)
        .bind(metric.in_multicast as i64)
        .bind(metric.in_bps)
        .bind(metric.out_bps)
        .bind(metric.utilization_in)
        .bind(metric.utilization_out)
        .bind(metric.pps)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn recent_for_interfaces(
        &self,
        interface_ids: &[InterfaceId],
        since: DateTime<Utc>,
    ) -> Result<Vec<InterfaceMetric>> {
        let ids: Vec<uuid::Uuid> = interface_ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, InterfaceMetricRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interface_metrics WHERE interface_id = ANY($1) AND timestamp >= $2 ORDER BY timestamp"
        ))
        .bind(&ids)
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM interface_metrics WHERE timestamp < $1")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
