use std::fmt;

use async_trait::async_trait;
use netmon_model::SystemEventLevel;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::SystemEvent;
use crate::store::ports::SystemEventRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresSystemEventRepository {
    pool: PgPool,
}

impl PostgresSystemEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresSystemEventRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSystemEventRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn level_as_str(level: SystemEventLevel) -> &'static str {
    match level {
        SystemEventLevel::Info => "info",
        SystemEventLevel::Warning => "warning",
        SystemEventLevel::Error => "error",
    }
}

#[async_trait]
impl SystemEventRepository for PostgresSystemEventRepository {
    async fn record(&self, event: &SystemEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_events (
                level, source, event_type, resource_type, resource_id,
                message, details, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(level_as_str(event.level))
        .bind(&event.source)
        .bind(&event.event_type)
        .bind(&event.resource_type)
        .bind(&event.resource_id)
        .bind(&event.message)
        .bind(&event.details)
        .bind(event.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
