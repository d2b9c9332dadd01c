use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use netmon_model::{ids::DeviceId, FlowType};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{FlowRecord, FlowSummary5m, FlowSummaryKey};
use crate::store::ports::FlowRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresFlowRepository {
    pool: PgPool,
}

impl PostgresFlowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresFlowRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresFlowRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn flow_type_as_str(t: FlowType) -> &'static str {
    match t {
        FlowType::NetflowV5 => "netflow_v5",
        FlowType::Sflow => "sflow",
    }
}

#[derive(sqlx::FromRow)]
struct FlowSummaryRow {
    bucket: DateTime<Utc>,
    device_id: Option<uuid::Uuid>,
    src_ip: IpNetwork,
    dst_ip: IpNetwork,
    src_port: i32,
    dst_port: i32,
    protocol_name: String,
    application: Option<String>,
    bytes: i64,
    packets: i64,
    flow_count: i64,
}

impl From<FlowSummaryRow> for FlowSummary5m {
    fn from(row: FlowSummaryRow) -> Self {
        FlowSummary5m {
            key: FlowSummaryKey {
                bucket: row.bucket,
                device_id: row.device_id.map(DeviceId::from),
                src_ip: row.src_ip.ip(),
                dst_ip: row.dst_ip.ip(),
                src_port: row.src_port as u16,
                dst_port: row.dst_port as u16,
                protocol_name: row.protocol_name,
                application: row.application,
            },
            bytes: row.bytes,
            packets: row.packets,
            flow_count: row.flow_count,
        }
    }
}

#[async_trait]
impl FlowRepository for PostgresFlowRepository {
    async fn insert_batch(&self, records: &[FlowRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO flow_records (
                    id, device_id, timestamp, src_ip, dst_ip, src_port, dst_port,
                    protocol, protocol_name, bytes, packets, duration_ms, tcp_flags,
                    application, flow_type
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(record.id)
            .bind(record.device_id.map(|id| id.as_uuid()))
            .bind(record.timestamp)
            .bind(IpNetwork::from(record.src_ip))
            .bind(IpNetwork::from(record.dst_ip))
            .bind(record.src_port as i32)
            .bind(record.dst_port as i32)
            .bind(record.protocol as i16)
            .bind(&record.protocol_name)
            .bind(record.bytes)
            .bind(record.packets)
            .bind(record.duration_ms)
            .bind(record.tcp_flags.map(|f| f as i16))
            .bind(&record.application)
            .bind(flow_type_as_str(record.flow_type))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn aggregate_for_rollup(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<FlowSummary5m>> {
        let rows = sqlx::query_as::<_, FlowSummaryRow>(
            r#"
            SELECT
                to_timestamp(floor(extract(epoch FROM "timestamp") / 300) * 300) AS bucket,
                device_id, src_ip, dst_ip, src_port, dst_port, protocol_name, application,
                SUM(bytes) AS bytes,
                SUM(packets) AS packets,
                COUNT(*) AS flow_count
            FROM flow_records
            WHERE timestamp >= $1 AND timestamp < $2
            GROUP BY bucket, device_id, src_ip, dst_ip, src_port, dst_port, protocol_name, application
            "#,
        )
        .bind(window_start)
        .bind(window_end)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_summary(&self, summary: &FlowSummary5m) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flow_summary_5m (
                bucket, device_id, src_ip, dst_ip, src_port, dst_port,
                protocol_name, application, bytes, packets, flow_count
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (bucket, device_id, src_ip, dst_ip, src_port, dst_port, protocol_name, (COALESCE(application, '')))
            DO UPDATE SET
                bytes = EXCLUDED.bytes,
                packets = EXCLUDED.packets,
                flow_count = EXCLUDED.flow_count
            "#,
        )
        .bind(summary.key.bucket)
        .bind(summary.key.device_id.map(|id| id.as_uuid()))
        .bind(IpNetwork::from(summary.key.src_ip))
        .bind(IpNetwork::from(summary.key.dst_ip))
        .bind(summary.key.src_port as i32)
        .bind(summary.key.dst_port as i32)
        .bind(&summary.key.protocol_name)
        .bind(&summary.key.application)
        .bind(summary.bytes)
        .bind(summary.packets)
        .bind(summary.flow_count)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn delete_records_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM flow_records WHERE timestamp < $1")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
