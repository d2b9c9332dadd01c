use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use netmon_model::{ids::DeviceId, DeviceStatus, DeviceType};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{Device, SnmpCredentials, SnmpVersion};
use crate::store::ports::DeviceRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresDeviceRepository {
    pool: PgPool,
}

impl PostgresDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresDeviceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDeviceRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: uuid::Uuid,
    hostname: String,
    ip_address: IpNetwork,
    device_type: String,
    snmp_port: i32,
    snmp_version: String,
    snmp_community: Option<String>,
    snmp_v3_username: Option<String>,
    snmp_v3_auth_key: Option<String>,
    snmp_v3_priv_key: Option<String>,
    snmp_v3_auth_protocol: Option<String>,
    snmp_v3_priv_protocol: Option<String>,
    api_username: Option<String>,
    api_password_encrypted: Option<String>,
    status: String,
    uptime_seconds: Option<i64>,
    cpu_usage: Option<f64>,
    memory_usage: Option<f64>,
    rtt_ms: Option<f64>,
    packet_loss_pct: Option<f64>,
    last_seen: Option<DateTime<Utc>>,
    is_active: bool,
    polling_enabled: bool,
    flow_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn device_type_from_str(s: &str) -> DeviceType {
    match s {
        "spine" => DeviceType::Spine,
        "leaf" => DeviceType::Leaf,
        "tor" => DeviceType::Tor,
        "switch" => DeviceType::Switch,
        "access" => DeviceType::Access,
        "distribution" => DeviceType::Distribution,
        "core" => DeviceType::Core,
        "router" => DeviceType::Router,
        "firewall" => DeviceType::Firewall,
        "pdu" => DeviceType::Pdu,
        _ => DeviceType::Switch,
    }
}

fn device_type_as_str(t: DeviceType) -> &'static str {
    match t {
        DeviceType::Spine => "spine",
        DeviceType::Leaf => "leaf",
        DeviceType::Tor => "tor",
        DeviceType::Switch => "switch",
        DeviceType::Access => "access",
        DeviceType::Distribution => "distribution",
        DeviceType::Core => "core",
        DeviceType::Router => "router",
        DeviceType::Firewall => "firewall",
        DeviceType::Pdu => "pdu",
    }
}

fn device_status_from_str(s: &str) -> DeviceStatus {
    match s {
        "up" => DeviceStatus::Up,
        "down" => DeviceStatus::Down,
        "degraded" => DeviceStatus::Degraded,
        _ => DeviceStatus::Unknown,
    }
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        let version = match row.snmp_version.as_str() {
            "v3" => SnmpVersion::V3,
            _ => SnmpVersion::V2c,
        };
        Device {
            id: DeviceId::from(row.id),
            hostname: row.hostname,
            ip_address: row.ip_address.ip(),
            device_type: device_type_from_str(&row.device_type),
            snmp_port: row.snmp_port as u16,
            snmp: SnmpCredentials {
                version,
                community: row.snmp_community,
                v3_username: row.snmp_v3_username,
                v3_auth_key: row.snmp_v3_auth_key,
                v3_priv_key: row.snmp_v3_priv_key,
                v3_auth_protocol: row.snmp_v3_auth_protocol,
                v3_priv_protocol: row.snmp_v3_priv_protocol,
            },
            api_username: row.api_username,
            api_password_encrypted: row.api_password_encrypted,
            status: device_status_from_str(&row.status),
            uptime_seconds: row.uptime_seconds,
            cpu_usage: row.cpu_usage,
            memory_usage: row.memory_usage,
            rtt_ms: row.rtt_ms,
            packet_loss_pct: row.packet_loss_pct,
            last_seen: row.last_seen,
            is_active: row.is_active,
            polling_enabled: row.polling_enabled,
            flow_enabled: row.flow_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, hostname, ip_address, device_type, snmp_port, snmp_version,
    snmp_community, snmp_v3_username, snmp_v3_auth_key, snmp_v3_priv_key,
    snmp_v3_auth_protocol, snmp_v3_priv_protocol,
    api_username, api_password_encrypted, status, uptime_seconds,
    cpu_usage, memory_usage, rtt_ms, packet_loss_pct, last_seen,
    is_active, polling_enabled, flow_enabled, created_at, updated_at
"#;

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn get(&self, id: DeviceId) -> Result<Device> {
        let row = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("device {id}")))?;

        Ok(row.into())
    }

    async fn find_by_ip(&self, ip: IpAddr) -> Result<Option<Device>> {
        let row = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM devices WHERE ip_address = $1"
        ))
        .bind(IpNetwork::from(ip))
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_active(&self) -> Result<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM devices WHERE is_active AND polling_enabled ORDER BY hostname"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_active_by_type(&self, device_type: DeviceType) -> Result<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM devices WHERE is_active AND polling_enabled AND device_type = $1 ORDER BY hostname"
        ))
        .bind(device_type_as_str(device_type))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_health(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        uptime_seconds: Option<i64>,
        cpu_usage: Option<f64>,
        memory_usage: Option<f64>,
        last_seen: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE devices
            SET status = $2, uptime_seconds = $3, cpu_usage = $4,
                memory_usage = $5, last_seen = $6, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.to_string())
        .bind(uptime_seconds)
        .bind(cpu_usage)
        .bind(memory_usage)
        .bind(last_seen)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn update_ping_stats(&self, id: DeviceId, rtt_avg_ms: Option<f64>, packet_loss_pct: f64) -> Result<()> {
        sqlx::query("UPDATE devices SET rtt_ms = $2, packet_loss_pct = $3, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(rtt_avg_ms)
            .bind(packet_loss_pct)
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
