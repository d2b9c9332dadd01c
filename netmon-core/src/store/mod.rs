//! Persistence layer: entity models, repository ports, Postgres
//! implementations, the Redis cache/lock wrapper, and schema migrations.

pub mod cache;
pub mod migrations;
pub mod models;
pub mod ports;
pub mod postgres;

use sqlx::PgPool;

use self::cache::RedisCache;
use self::postgres::{
    PostgresAlertEventRepository, PostgresAlertRuleRepository, PostgresDeviceRepository,
    PostgresFlowRepository, PostgresInterfaceRepository, PostgresMacDiscoveryRepository,
    PostgresMetricsRepository, PostgresMlagRepository, PostgresOwnedSubnetRepository,
    PostgresPduRepository, PostgresPingRepository, PostgresSettingsRepository,
    PostgresSystemEventRepository,
};

/// Bundles every repository behind a single handle so job/alert/collector
/// code only needs to thread one value through, the way `ferrex-server`'s
/// `AppState` bundles its repositories.
#[derive(Clone)]
pub struct Store {
    pub devices: PostgresDeviceRepository,
    pub interfaces: PostgresInterfaceRepository,
    pub metrics: PostgresMetricsRepository,
    pub pdu: PostgresPduRepository,
    pub flows: PostgresFlowRepository,
    pub alert_rules: PostgresAlertRuleRepository,
    pub alert_events: PostgresAlertEventRepository,
    pub mac: PostgresMacDiscoveryRepository,
    pub settings: PostgresSettingsRepository,
    pub system_events: PostgresSystemEventRepository,
    pub owned_subnets: PostgresOwnedSubnetRepository,
    pub mlag: PostgresMlagRepository,
    pub ping: PostgresPingRepository,
    pub cache: RedisCache,
}

impl Store {
    pub fn new(pool: PgPool, cache: RedisCache) -> Self {
        Self {
            devices: PostgresDeviceRepository::new(pool.clone()),
            interfaces: PostgresInterfaceRepository::new(pool.clone()),
            metrics: PostgresMetricsRepository::new(pool.clone()),
            pdu: PostgresPduRepository::new(pool.clone()),
            flows: PostgresFlowRepository::new(pool.clone()),
            alert_rules: PostgresAlertRuleRepository::new(pool.clone()),
            alert_events: PostgresAlertEventRepository::new(pool.clone()),
            mac: PostgresMacDiscoveryRepository::new(pool.clone()),
            settings: PostgresSettingsRepository::new(pool.clone()),
            system_events: PostgresSystemEventRepository::new(pool.clone()),
            owned_subnets: PostgresOwnedSubnetRepository::new(pool.clone()),
            mlag: PostgresMlagRepository::new(pool.clone()),
            ping: PostgresPingRepository::new(pool),
            cache,
        }
    }
}
