//! Entity rows mirroring §3. Every timestamp is UTC with timezone; ids use
//! the typed wrappers from `netmon_model`.

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use netmon_model::{
    ids::{AlertEventId, AlertRuleId, DeviceId, InterfaceId, PowerAlertRuleId, WanAlertRuleId},
    AlertStatus, Condition, DeviceStatus, DeviceType, OperStatus, SubnetSource,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpCredentials {
    pub version: SnmpVersion,
    pub community: Option<String>,
    pub v3_username: Option<String>,
    pub v3_auth_key: Option<String>,
    pub v3_priv_key: Option<String>,
    pub v3_auth_protocol: Option<String>,
    pub v3_priv_protocol: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnmpVersion {
    V2c,
    V3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub hostname: String,
    pub ip_address: IpAddr,
    pub device_type: DeviceType,
    pub snmp_port: u16,
    pub snmp: SnmpCredentials,
    /// Encrypted at rest (§4.7); `None` when the device has no API access.
    pub api_username: Option<String>,
    pub api_password_encrypted: Option<String>,
    pub status: DeviceStatus,
    pub uptime_seconds: Option<i64>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
    pub rtt_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub polling_enabled: bool,
    pub flow_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// §3: soft-deleted devices never enter a scheduler job.
    pub fn is_schedulable(&self) -> bool {
        self.is_active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    pub device_id: DeviceId,
    pub if_index: Option<i32>,
    pub name: String,
    pub alias: Option<String>,
    pub speed_bps: Option<i64>,
    pub admin_status: OperStatus,
    pub oper_status: OperStatus,
    pub last_change: Option<DateTime<Utc>>,
    pub is_monitored: bool,
    pub is_wan: bool,
    pub is_uplink: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceMetric {
    pub interface_id: InterfaceId,
    pub timestamp: DateTime<Utc>,
    pub in_octets: u64,
    pub out_octets: u64,
    pub in_packets: u64,
    pub out_packets: u64,
    pub in_errors: u64,
    pub out_errors: u64,
    pub in_discards: u64,
    pub out_discards: u64,
    pub in_broadcast: u64,
    pub in_multicast: u64,
    pub in_bps: f64,
    pub out_bps: f64,
    pub utilization_in: f64,
    pub utilization_out: f64,
    pub pps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortStateChange {
    pub interface_id: InterfaceId,
    pub old_status: OperStatus,
    pub new_status: OperStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: uuid::Uuid,
    pub device_id: Option<DeviceId>,
    pub timestamp: DateTime<Utc>,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub protocol_name: String,
    pub bytes: i64,
    pub packets: i64,
    pub duration_ms: i64,
    pub tcp_flags: Option<u8>,
    pub application: Option<String>,
    pub flow_type: netmon_model::FlowType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummaryKey {
    pub bucket: DateTime<Utc>,
    pub device_id: Option<DeviceId>,
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol_name: String,
    pub application: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSummary5m {
    pub key: FlowSummaryKey,
    pub bytes: i64,
    pub packets: i64,
    pub flow_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PduMetric {
    pub device_id: DeviceId,
    pub timestamp: DateTime<Utc>,
    pub total_power_watts: f64,
    pub total_energy_kwh: Option<f64>,
    pub apparent_power_va: f64,
    pub power_factor: Option<f64>,
    pub load_pct: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PduBank {
    pub device_id: DeviceId,
    pub number: i32,
    pub overload_threshold_amps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PduBankMetric {
    pub device_id: DeviceId,
    pub bank_number: i32,
    pub timestamp: DateTime<Utc>,
    pub current_amps: f64,
    pub power_watts: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PduOutlet {
    pub device_id: DeviceId,
    pub number: i32,
    pub name: Option<String>,
    pub state: netmon_model::OutletState,
    pub bank_number: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: AlertRuleId,
    pub name: String,
    pub metric: netmon_model::AlertMetric,
    pub condition: netmon_model::Condition,
    pub threshold: Option<f64>,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub default_severity: netmon_model::Severity,
    pub cooldown_minutes: i32,
    pub device_id: Option<DeviceId>,
    pub interface_id: Option<InterfaceId>,
    pub email_sink: Option<String>,
    pub webhook_sink: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WanAlertRule {
    pub id: WanAlertRuleId,
    pub name: String,
    pub metric: netmon_model::aggregate::WanMetric,
    pub condition: Condition,
    pub lookback_minutes: i64,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub email_sink: Option<String>,
    pub webhook_sink: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerAlertRule {
    pub id: PowerAlertRuleId,
    pub name: String,
    pub metric: netmon_model::aggregate::PowerMetric,
    pub condition: Condition,
    pub lookback_minutes: i64,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub email_sink: Option<String>,
    pub webhook_sink: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: AlertEventId,
    pub rule_id: Option<AlertRuleId>,
    pub wan_rule_id: Option<WanAlertRuleId>,
    pub power_rule_id: Option<PowerAlertRuleId>,
    pub device_id: Option<DeviceId>,
    pub severity: netmon_model::Severity,
    pub status: AlertStatus,
    pub message: String,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub triggered_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedSubnet {
    pub cidr: IpNetwork,
    pub source: SubnetSource,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub is_secret: bool,
    pub updated_by: Option<String>,
}

/// MLAG pairing observed on a device (§4.2.2). Not independently persisted
/// across devices — one row per device that reports an active MLAG peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlagDomain {
    pub device_id: DeviceId,
    pub domain_id: String,
    pub peer_address: Option<IpAddr>,
    pub peer_state: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlagInterface {
    pub device_id: DeviceId,
    pub local_interface: String,
    pub peer_interface: Option<String>,
    pub mlag_id: i32,
    pub state: String,
}

/// ICMP probe result (§4.6 Ping Monitor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMetric {
    pub device_id: DeviceId,
    pub timestamp: DateTime<Utc>,
    pub rtt_min_ms: Option<f64>,
    pub rtt_avg_ms: Option<f64>,
    pub rtt_max_ms: Option<f64>,
    pub packet_loss_pct: f64,
    pub packets_sent: i32,
    pub packets_received: i32,
    pub status: PingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PingStatus {
    Ok,
    Loss,
    Timeout,
}

impl PingStatus {
    /// `ok` when nothing was lost, `timeout` when everything was, `loss`
    /// for anything in between — the same three-way split `ping_monitor.py`
    /// derives from parsed loss percentage.
    pub fn from_loss_pct(loss_pct: f64) -> Self {
        if loss_pct <= 0.0 {
            PingStatus::Ok
        } else if loss_pct >= 100.0 {
            PingStatus::Timeout
        } else {
            PingStatus::Loss
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PingStatus::Ok => "ok",
            PingStatus::Loss => "loss",
            PingStatus::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemEvent {
    pub level: netmon_model::SystemEventLevel,
    pub source: String,
    pub event_type: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
