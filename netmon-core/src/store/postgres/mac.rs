use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use netmon_model::ids::DeviceId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::ports::MacDiscoveryRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresMacDiscoveryRepository {
    pool: PgPool,
}

impl PostgresMacDiscoveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresMacDiscoveryRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresMacDiscoveryRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl MacDiscoveryRepository for PostgresMacDiscoveryRepository {
    async fn upsert_mac_entry(
        &self,
        device_id: DeviceId,
        mac_address: &str,
        if_index: Option<i32>,
        vlan_id: Option<i32>,
        ip_address: Option<IpAddr>,
        vendor: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO mac_entries (
                device_id, mac_address, if_index, vlan_id, ip_address, vendor,
                first_seen, last_seen
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (device_id, mac_address, vlan_id)
            DO UPDATE SET
                if_index = EXCLUDED.if_index,
                ip_address = COALESCE(EXCLUDED.ip_address, mac_entries.ip_address),
                vendor = COALESCE(EXCLUDED.vendor, mac_entries.vendor),
                last_seen = EXCLUDED.last_seen
            "#,
        )
        .bind(device_id.as_uuid())
        .bind(mac_address)
        .bind(if_index)
        .bind(vlan_id)
        .bind(ip_address.map(IpNetwork::from))
        .bind(vendor)
        .bind(seen_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
