//! Schema migration runner and first-boot `system_settings` seeding,
//! mirroring `ferrex-core::database::postgres::PostgresDatabase::initialize_schema`'s
//! `sqlx::migrate!` call.

use sqlx::PgPool;
use tracing::info;

use crate::error::StoreError;
use crate::store::ports::SettingsRepository;
use crate::store::postgres::PostgresSettingsRepository;

type Result<T> = std::result::Result<T, StoreError>;

/// Defaults seeded only if absent, so an operator's prior overrides survive
/// a restart (SPEC_FULL §2).
// `flow_rollup_backfilled` is deliberately absent from this list:
// `flow::rollup::backfill_if_needed` only checks for the *presence* of
// that key, and the original (`main.py`) only ever writes it, with value
// "true", after `backfill_summaries()` actually completes — never as part
// of its default-settings seed. Seeding it here would make a fresh
// database look already-backfilled and skip the one-time historical
// backfill on every first boot (§4.4).
const DEFAULT_SETTINGS: &[(&str, &str, bool)] = &[
    ("snmp_poll_interval", "60", false),
    ("alert_eval_interval", "60", false),
    ("wan_commitment_bps", "0", false),
    ("power_budget_watts", "0", false),
];

pub async fn run(pool: &PgPool) -> Result<()> {
    info!("running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;

    let settings = PostgresSettingsRepository::new(pool.clone());
    for (key, value, is_secret) in DEFAULT_SETTINGS {
        settings.seed_default(key, value, *is_secret).await?;
    }

    info!("database migrations and default settings complete");
    Ok(())
}
