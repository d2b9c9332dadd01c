//! Repository ports consumed by the pollers, collector, rollup, and alert
//! engines. Keeping these as traits (rather than calling `sqlx` directly
//! from domain code) lets the alert-engine tests substitute `mockall`
//! doubles instead of a live Postgres instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netmon_model::{
    ids::{AlertEventId, DeviceId, InterfaceId},
    AlertEventKey, AlertStatus, OperStatus,
};

use crate::error::StoreError;
use crate::store::models::*;

type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn get(&self, id: DeviceId) -> Result<Device>;
    async fn find_by_ip(&self, ip: std::net::IpAddr) -> Result<Option<Device>>;
    /// Only `is_active = true` rows — the set every scheduler job polls.
    async fn list_active(&self) -> Result<Vec<Device>>;
    async fn list_active_by_type(&self, device_type: netmon_model::DeviceType) -> Result<Vec<Device>>;
    async fn update_health(
        &self,
        id: DeviceId,
        status: netmon_model::DeviceStatus,
        uptime_seconds: Option<i64>,
        cpu_usage: Option<f64>,
        memory_usage: Option<f64>,
        last_seen: DateTime<Utc>,
    ) -> Result<()>;
    /// Updates the device's latest-RTT/packet-loss snapshot (§4.6 Ping
    /// Monitor); distinct from `update_health` since SNMP polling and ICMP
    /// probing run on independent schedules and must not clobber each
    /// other's fields.
    async fn update_ping_stats(&self, id: DeviceId, rtt_avg_ms: Option<f64>, packet_loss_pct: f64) -> Result<()>;
}

#[async_trait]
pub trait InterfaceRepository: Send + Sync {
    async fn get(&self, id: InterfaceId) -> Result<Interface>;
    async fn list_monitored_for_device(&self, device_id: DeviceId) -> Result<Vec<Interface>>;
    async fn find_by_if_index(
        &self,
        device_id: DeviceId,
        if_index: i32,
    ) -> Result<Option<Interface>>;
    async fn list_wan_interfaces(&self) -> Result<Vec<Interface>>;
    async fn update_oper_status(&self, id: InterfaceId, status: OperStatus) -> Result<()>;
    async fn record_state_change(&self, change: &PortStateChange) -> Result<()>;
    /// Number of `PortStateChange` rows for this interface in the trailing
    /// window — backs the >5-in-10-minutes flap definition (GLOSSARY).
    async fn count_recent_state_changes(
        &self,
        interface_id: InterfaceId,
        since: DateTime<Utc>,
    ) -> Result<i64>;
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn latest_for_interface(&self, interface_id: InterfaceId) -> Result<Option<InterfaceMetric>>;
    async fn insert(&self, metric: &InterfaceMetric) -> Result<()>;
    async fn recent_for_interfaces(
        &self,
        interface_ids: &[InterfaceId],
        since: DateTime<Utc>,
    ) -> Result<Vec<InterfaceMetric>>;
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait PduRepository: Send + Sync {
    async fn upsert_bank(&self, bank: &PduBank) -> Result<()>;
    async fn upsert_outlet(&self, outlet: &PduOutlet) -> Result<()>;
    async fn insert_metric(&self, metric: &PduMetric) -> Result<()>;
    async fn insert_bank_metric(&self, metric: &PduBankMetric) -> Result<()>;
    async fn recent_metrics_for_devices(
        &self,
        device_ids: &[DeviceId],
        since: DateTime<Utc>,
    ) -> Result<Vec<PduMetric>>;
    async fn delete_metrics_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait FlowRepository: Send + Sync {
    async fn insert_batch(&self, records: &[FlowRecord]) -> Result<()>;
    /// Aggregation source for `rollup_flows()` (§4.4): all records whose
    /// `timestamp` falls in `[window_start, window_end)`.
    async fn aggregate_for_rollup(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<FlowSummary5m>>;
    async fn upsert_summary(&self, summary: &FlowSummary5m) -> Result<()>;
    async fn delete_records_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait AlertRuleRepository: Send + Sync {
    async fn list_active_device_rules(&self) -> Result<Vec<AlertRule>>;
    async fn list_active_wan_rules(&self) -> Result<Vec<WanAlertRule>>;
    async fn list_active_power_rules(&self) -> Result<Vec<PowerAlertRule>>;
}

#[async_trait]
pub trait AlertEventRepository: Send + Sync {
    /// Fetch the currently active (open/acknowledged) event for a key, if
    /// any — the read half of the §3 uniqueness invariant.
    async fn find_active(&self, key: &AlertEventKey) -> Result<Option<AlertEvent>>;
    async fn insert(&self, event: &AlertEvent) -> Result<AlertEventId>;
    async fn update_values(
        &self,
        id: AlertEventId,
        metric_value: f64,
        threshold_value: f64,
        message: &str,
    ) -> Result<()>;
    async fn auto_resolve(&self, id: AlertEventId) -> Result<()>;
    async fn acknowledge(&self, id: AlertEventId, by: &str) -> Result<()>;
    async fn resolve(&self, id: AlertEventId) -> Result<()>;
    async fn list_open(&self, rule_id: uuid::Uuid, device_id: Option<DeviceId>) -> Result<Vec<AlertEvent>>;
    /// Backs `GET /api/alerts/events` (§6): most recent events first,
    /// optionally narrowed to one status.
    async fn list_recent(&self, status: Option<AlertStatus>, limit: i64) -> Result<Vec<AlertEvent>>;
}

#[async_trait]
pub trait MacDiscoveryRepository: Send + Sync {
    async fn upsert_mac_entry(
        &self,
        device_id: DeviceId,
        mac_address: &str,
        if_index: Option<i32>,
        vlan_id: Option<i32>,
        ip_address: Option<std::net::IpAddr>,
        vendor: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SystemSetting>>;
    async fn get_f64(&self, key: &str) -> Result<Option<f64>>;
    async fn set(&self, key: &str, value: &str, is_secret: bool, updated_by: Option<&str>) -> Result<()>;
    /// Seeds a default row only if absent — used for first-boot bootstrap
    /// (SPEC_FULL §2).
    async fn seed_default(&self, key: &str, value: &str, is_secret: bool) -> Result<()>;
}

#[async_trait]
pub trait SystemEventRepository: Send + Sync {
    async fn record(&self, event: &SystemEvent) -> Result<()>;
}

#[async_trait]
pub trait OwnedSubnetRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<OwnedSubnet>>;
}

#[async_trait]
pub trait PingRepository: Send + Sync {
    async fn insert(&self, metric: &PingMetric) -> Result<()>;
}

#[async_trait]
pub trait MlagRepository: Send + Sync {
    /// Replaces the domain row and all interface children for this device
    /// in one step — the discovery run always sees a consistent snapshot,
    /// matching §4.2.2's "replaces MlagInterface children on each run".
    async fn replace_domain(&self, domain: &MlagDomain, interfaces: &[MlagInterface]) -> Result<()>;
    /// Deletes the domain (cascading to its interfaces) when a run no
    /// longer observes any MLAG on the device.
    async fn delete_domain(&self, device_id: DeviceId) -> Result<()>;
}
