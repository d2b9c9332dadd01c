use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::ids::DeviceId;
use netmon_model::OutletState;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{PduBank, PduBankMetric, PduMetric, PduOutlet};
use crate::store::ports::PduRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresPduRepository {
    pool: PgPool,
}

impl PostgresPduRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresPduRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresPduRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn outlet_state_as_str(s: OutletState) -> &'static str {
    match s {
        OutletState::On => "on",
        OutletState::Off => "off",
        OutletState::MeteredOnly => "metered_only",
    }
}

#[derive(sqlx::FromRow)]
struct PduMetricRow {
    device_id: uuid::Uuid,
    timestamp: DateTime<Utc>,
    total_power_watts: f64,
    total_energy_kwh: Option<f64>,
    apparent_power_va: f64,
    power_factor: Option<f64>,
    load_pct: Option<f64>,
    temperature_c: Option<f64>,
    humidity_pct: Option<f64>,
}

impl From<PduMetricRow> for PduMetric {
    fn from(row: PduMetricRow) -> Self {
        PduMetric {
            device_id: DeviceId::from(row.device_id),
            timestamp: row.timestamp,
            total_power_watts: row.total_power_watts,
            total_energy_kwh: row.total_energy_kwh,
            apparent_power_va: row.apparent_power_va,
            power_factor: row.power_factor,
            load_pct: row.load_pct,
            temperature_c: row.temperature_c,
            humidity_pct: row.humidity_pct,
        }
    }
}

#[async_trait]
impl PduRepository for PostgresPduRepository {
    async fn upsert_bank(&self, bank: &PduBank) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pdu_banks (device_id, number, overload_threshold_amps)
            VALUES ($1, $2, $3)
            ON CONFLICT (device_id, number)
            DO UPDATE SET overload_threshold_amps = EXCLUDED.overload_threshold_amps
            "#,
        )
        .bind(bank.device_id.as_uuid())
        .bind(bank.number)
        .bind(bank.overload_threshold_amps)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn upsert_outlet(&self, outlet: &PduOutlet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pdu_outlets (device_id, number, name, state, bank_number)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (device_id, number)
            DO UPDATE SET name = EXCLUDED.name, state = EXCLUDED.state, bank_number = EXCLUDED.bank_number
            "#,
        )
        .bind(outlet.device_id.as_uuid())
        .bind(outlet.number)
        .bind(&outlet.name)
        .bind(outlet_state_as_str(outlet.state))
        .bind(outlet.bank_number)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn insert_metric(&self, metric: &PduMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pdu_metrics (
                device_id, timestamp, total_power_watts, total_energy_kwh,
                apparent_power_va, power_factor, load_pct, temperature_c, humidity_pct
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(metric.device_id.as_uuid())
        .bind(metric.timestamp)
        .bind(metric.total_power_watts)
        .bind(metric.total_energy_kwh)
        .bind(metric.apparent_power_va)
        .bind(metric.power_factor)
        .bind(metric.load_pct)
        .bind(metric.temperature_c)
        .bind(metric.humidity_pct)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn insert_bank_metric(&self, metric: &PduBankMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pdu_bank_metrics (device_id, bank_number, timestamp, current_amps, power_watts)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(metric.device_id.as_uuid())
        .bind(metric.bank_number)
        .bind(metric.timestamp)
        .bind(metric.current_amps)
        .bind(metric.power_watts)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn recent_metrics_for_devices(
        &self,
        device_ids: &[DeviceId],
        since: DateTime<Utc>,
    ) -> Result<Vec<PduMetric>> {
        let ids: Vec<uuid::Uuid> = device_ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, PduMetricRow>(
            r#"
            SELECT device_id, timestamp, total_power_watts, total_energy_kwh,
                   apparent_power_va, power_factor, load_pct, temperature_c, humidity_pct
            FROM pdu_metrics
            WHERE device_id = ANY($1) AND timestamp >= $2
            ORDER BY timestamp
            "#,
        )
        .bind(&ids)
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_metrics_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pdu_metrics WHERE timestamp < $1")
            .bind(cutoff)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
