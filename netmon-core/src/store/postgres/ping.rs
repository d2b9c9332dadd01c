use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::PingMetric;
use crate::store::ports::PingRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresPingRepository {
    pool: PgPool,
}

impl PostgresPingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresPingRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresPingRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl PingRepository for PostgresPingRepository {
    async fn insert(&self, metric: &PingMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ping_metrics (
                device_id, "timestamp", rtt_min_ms, rtt_avg_ms, rtt_max_ms,
                packet_loss_pct, packets_sent, packets_received, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(metric.device_id.as_uuid())
        .bind(metric.timestamp)
        .bind(metric.rtt_min_ms)
        .bind(metric.rtt_avg_ms)
        .bind(metric.rtt_max_ms)
        .bind(metric.packet_loss_pct)
        .bind(metric.packets_sent)
        .bind(metric.packets_received)
        .bind(metric.status.as_str())
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
