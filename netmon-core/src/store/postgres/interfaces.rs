use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::{ids::DeviceId, ids::InterfaceId, OperStatus};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{Interface, PortStateChange};
use crate::store::ports::InterfaceRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresInterfaceRepository {
    pool: PgPool,
}

impl PostgresInterfaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresInterfaceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresInterfaceRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

pub(crate) fn oper_status_from_str(s: &str) -> OperStatus {
    match s {
        "up" => OperStatus::Up,
        "down" => OperStatus::Down,
        "testing" => OperStatus::Testing,
        "dormant" => OperStatus::Dormant,
        "not_present" => OperStatus::NotPresent,
        "lower_layer_down" => OperStatus::LowerLayerDown,
        _ => OperStatus::Unknown,
    }
}

pub(crate) fn oper_status_as_str(s: OperStatus) -> &'static str {
    match s {
        OperStatus::Up => "up",
        OperStatus::Down => "down",
        OperStatus::Testing => "testing",
        OperStatus::Dormant => "dormant",
        OperStatus::NotPresent => "not_present",
        OperStatus::LowerLayerDown => "lower_layer_down",
        OperStatus::Unknown => "unknown",
    }
}

#[derive(sqlx::FromRow)]
struct InterfaceRow {
    id: uuid::Uuid,
    device_id: uuid::Uuid,
    if_index: Option<i32>,
    name: String,
    alias: Option<String>,
    speed_bps: Option<i64>,
    admin_status: String,
    oper_status: String,
    last_change: Option<DateTime<Utc>>,
    is_monitored: bool,
    is_wan: bool,
    is_uplink: bool,
}

impl From<InterfaceRow> for Interface {
    fn from(row: InterfaceRow) -> Self {
        Interface {
            id: InterfaceId::from(row.id),
            device_id: DeviceId::from(row.device_id),
            if_index: row.if_index,
            name: row.name,
            alias: row.alias,
            speed_bps: row.speed_bps,
            admin_status: oper_status_from_str(&row.admin_status),
            oper_status: oper_status_from_str(&row.oper_status),
            last_change: row.last_change,
            is_monitored: row.is_monitored,
            is_wan: row.is_wan,
            is_uplink: row.is_uplink,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    id, device_id, if_index, name, alias, speed_bps, admin_status,
    oper_status, last_change, is_monitored, is_wan, is_uplink
"#;

#[async_trait]
impl InterfaceRepository for PostgresInterfaceRepository {
    async fn get(&self, id: InterfaceId) -> Result<Interface> {
        let row = sqlx::query_as::<_, InterfaceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interfaces WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("interface {id}")))?;

        Ok(row.into())
    }

    async fn list_monitored_for_device(&self, device_id: DeviceId) -> Result<Vec<Interface>> {
        let rows = sqlx::query_as::<_, InterfaceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interfaces WHERE device_id = $1 AND is_monitored ORDER BY if_index"
        ))
        .bind(device_id.as_uuid())
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_if_index(
        &self,
        device_id: DeviceId,
        if_index: i32,
    ) -> Result<Option<Interface>> {
        let row = sqlx::query_as::<_, InterfaceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interfaces WHERE device_id = $1 AND if_index = $2"
        ))
        .bind(device_id.as_uuid())
        .bind(if_index)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_wan_interfaces(&self) -> Result<Vec<Interface>> {
        let rows = sqlx::query_as::<_, InterfaceRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM interfaces WHERE is_wan AND is_monitored ORDER BY name"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_oper_status(&self, id: InterfaceId, status: OperStatus) -> Result<()> {
        sqlx::query(
            "UPDATE interfaces SET oper_status = $2, last_change = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(oper_status_as_str(status))
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn record_state_change(&self, change: &PortStateChange) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO port_state_changes (interface_id, old_status, new_status, changed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(change.interface_id.as_uuid())
        .bind(oper_status_as_str(change.old_status))
        .bind(oper_status_as_str(change.new_status))
        .bind(change.changed_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn count_recent_state_changes(
        &self,
        interface_id: InterfaceId,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM port_state_changes WHERE interface_id = $1 AND changed_at >= $2",
        )
        .bind(interface_id.as_uuid())
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }
}
