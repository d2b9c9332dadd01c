//! Enumerations shared by the store, poller, collector, and alert engines.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Spine,
    Leaf,
    Tor,
    Switch,
    Access,
    Distribution,
    Core,
    Router,
    Firewall,
    Pdu,
}

impl DeviceType {
    /// PDU devices are excluded from the interface-counter poll path (§4.2).
    pub fn is_pdu(self) -> bool {
        matches!(self, DeviceType::Pdu)
    }

    /// Device types eligible for MAC table and MLAG discovery (§4.2.2);
    /// firewalls and PDUs never carry a bridge/MLAG table.
    pub fn is_switch(self) -> bool {
        matches!(
            self,
            DeviceType::Spine
                | DeviceType::Leaf
                | DeviceType::Tor
                | DeviceType::Switch
                | DeviceType::Access
                | DeviceType::Distribution
                | DeviceType::Core
                | DeviceType::Router
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Up,
    Down,
    Degraded,
    Unknown,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceStatus::Up => "up",
            DeviceStatus::Down => "down",
            DeviceStatus::Degraded => "degraded",
            DeviceStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperStatus {
    Up,
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    DeviceStatus,
    CpuUsage,
    MemoryUsage,
    IfUtilizationIn,
    IfUtilizationOut,
    IfStatus,
    IfErrors,
}

impl AlertMetric {
    /// True for the two metrics §4.5 encodes as 1.0=down / 0.0=up rather
    /// than a continuous measurement.
    pub fn is_boolean(self) -> bool {
        matches!(self, AlertMetric::DeviceStatus | AlertMetric::IfStatus)
    }

    /// True when the metric is device-scoped (as opposed to interface-scoped).
    pub fn is_device_level(self) -> bool {
        matches!(
            self,
            AlertMetric::DeviceStatus | AlertMetric::CpuUsage | AlertMetric::MemoryUsage
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl Condition {
    /// Evaluate `value <condition> threshold`.
    pub fn breached(self, value: f64, threshold: f64) -> bool {
        match self {
            Condition::Gt => value > threshold,
            Condition::Gte => value >= threshold,
            Condition::Lt => value < threshold,
            Condition::Lte => value <= threshold,
            Condition::Eq => (value - threshold).abs() < f64::EPSILON,
            Condition::Ne => (value - threshold).abs() >= f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    /// Statuses the §3 uniqueness invariant considers "still active".
    pub fn is_active(self) -> bool {
        matches!(self, AlertStatus::Open | AlertStatus::Acknowledged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    NetflowV5,
    Sflow,
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowType::NetflowV5 => "netflow_v5",
            FlowType::Sflow => "sflow",
        };
        write!(f, "{s}")
    }
}

/// Discriminates which rule family an [`AlertEvent`](crate::AlertEventKey)
/// belongs to — the three engines share one lifecycle but never the same
/// foreign key (§3 invariant: exactly one of rule_id/wan_rule_id/power_rule_id
/// is set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    Device,
    Wan,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutletState {
    On,
    Off,
    MeteredOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetSource {
    Learned,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemEventLevel {
    Info,
    Warning,
    Error,
}
