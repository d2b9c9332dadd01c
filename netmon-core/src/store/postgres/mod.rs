//! Postgres implementations of the `store::ports` traits. Each repository
//! wraps a [`sqlx::PgPool`] and maps its table's rows through a private
//! `*Row` struct (mirroring `ferrex-core`'s repository layer) rather than
//! using the compile-time-checked `query!` macro, since this workspace is
//! built without a live database available at compile time.

mod alert_events;
mod alert_rules;
mod devices;
mod flows;
mod interfaces;
mod mac;
mod metrics;
mod mlag;
mod owned_subnets;
mod pdu;
mod ping;
mod settings;
mod system_events;

pub use alert_events::PostgresAlertEventRepository;
pub use alert_rules::PostgresAlertRuleRepository;
pub use devices::PostgresDeviceRepository;
pub use flows::PostgresFlowRepository;
pub use interfaces::PostgresInterfaceRepository;
pub use mac::PostgresMacDiscoveryRepository;
pub use metrics::PostgresMetricsRepository;
pub use mlag::PostgresMlagRepository;
pub use owned_subnets::PostgresOwnedSubnetRepository;
pub use pdu::PostgresPduRepository;
pub use ping::PostgresPingRepository;
pub use settings::PostgresSettingsRepository;
pub use system_events::PostgresSystemEventRepository;
