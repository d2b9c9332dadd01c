use std::fmt;

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use netmon_model::ids::DeviceId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::{MlagDomain, MlagInterface};
use crate::store::ports::MlagRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresMlagRepository {
    pool: PgPool,
}

impl PostgresMlagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresMlagRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresMlagRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl MlagRepository for PostgresMlagRepository {
    async fn replace_domain(&self, domain: &MlagDomain, interfaces: &[MlagInterface]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO mlag_domains (device_id, domain_id, peer_address, peer_state, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (device_id)
            DO UPDATE SET domain_id = EXCLUDED.domain_id, peer_address = EXCLUDED.peer_address,
                          peer_state = EXCLUDED.peer_state, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(domain.device_id.as_uuid())
        .bind(&domain.domain_id)
        .bind(domain.peer_address.map(IpNetwork::from))
        .bind(&domain.peer_state)
        .bind(domain.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM mlag_interfaces WHERE device_id = $1")
            .bind(domain.device_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for iface in interfaces {
            sqlx::query(
                r#"
                INSERT INTO mlag_interfaces (device_id, local_interface, peer_interface, mlag_id, state)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(iface.device_id.as_uuid())
            .bind(&iface.local_interface)
            .bind(&iface.peer_interface)
            .bind(iface.mlag_id)
            .bind(&iface.state)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_domain(&self, device_id: DeviceId) -> Result<()> {
        sqlx::query("DELETE FROM mlag_domains WHERE device_id = $1")
            .bind(device_id.as_uuid())
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
