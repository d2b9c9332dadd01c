use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::models::SystemSetting;
use crate::store::ports::SettingsRepository;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl fmt::Debug for PostgresSettingsRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettingsRepository")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(sqlx::FromRow)]
struct SystemSettingRow {
    key: String,
    value: String,
    is_secret: bool,
    updated_by: Option<String>,
}

impl From<SystemSettingRow> for SystemSetting {
    fn from(row: SystemSettingRow) -> Self {
        SystemSetting {
            key: row.key,
            value: row.value,
            is_secret: row.is_secret,
            updated_by: row.updated_by,
        }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<SystemSetting>> {
        let row = sqlx::query_as::<_, SystemSettingRow>(
            "SELECT key, value, is_secret, updated_by FROM system_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        let setting = self.get(key).await?;
        Ok(setting.and_then(|s| s.value.parse::<f64>().ok()))
    }

    async fn set(&self, key: &str, value: &str, is_secret: bool, updated_by: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, is_secret, updated_by, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value, is_secret = EXCLUDED.is_secret,
                          updated_by = EXCLUDED.updated_by, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(is_secret)
        .bind(updated_by)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn seed_default(&self, key: &str, value: &str, is_secret: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, is_secret, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(is_secret)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
