use std::fmt;

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use netmon_model::SubnetSource;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::OwnedSubnet;
use crate::store::ports::OwnedSubnetRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresOwnedSubnetRepository {
    pool: PgPool,
}

impl PostgresOwnedSubnetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresOwnedSubnetRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresOwnedSubnetRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct OwnedSubnetRow {
    cidr: IpNetwork,
    source: String,
    is_active: bool,
}

impl From<OwnedSubnetRow> for OwnedSubnet {
    fn from(row: OwnedSubnetRow) -> Self {
        OwnedSubnet {
            cidr: row.cidr,
            source: match row.source.as_str() {
                "manual" => SubnetSource::Manual,
                _ => SubnetSource::Learned,
            },
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl OwnedSubnetRepository for PostgresOwnedSubnetRepository {
    async fn list_active(&self) -> Result<Vec<OwnedSubnet>> {
        let rows = sqlx::query_as::<_, OwnedSubnetRow>(
            "SELECT cidr, source, is_active FROM owned_subnets WHERE is_active",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
