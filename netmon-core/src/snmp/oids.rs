//! Object identifiers the poller walks or gets. Mirrors the constant table
//! the original Python poller kept at module scope
//! (`app/services/snmp_poller.py`), grouped the same way: system, interface
//! (32-bit and high-capacity 64-bit counters), and the APC PDU trees used by
//! [`crate::snmp::pdu_poller`].

pub const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";
pub const SYS_NAME: &str = "1.3.6.1.2.1.1.5.0";

pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
pub const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
pub const IF_ADMIN_STATUS: &str = "1.3.6.1.2.1.2.2.1.7";
pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";
pub const IF_IN_OCTETS: &str = "1.3.6.1.2.1.2.2.1.10";
pub const IF_IN_ERRORS: &str = "1.3.6.1.2.1.2.2.1.14";
pub const IF_IN_DISCARDS: &str = "1.3.6.1.2.1.2.2.1.13";
pub const IF_OUT_OCTETS: &str = "1.3.6.1.2.1.2.2.1.16";
pub const IF_OUT_ERRORS: &str = "1.3.6.1.2.1.2.2.1.20";
pub const IF_OUT_DISCARDS: &str = "1.3.6.1.2.1.2.2.1.19";
pub const IF_IN_UCAST_PKTS: &str = "1.3.6.1.2.1.2.2.1.11";
pub const IF_OUT_UCAST_PKTS: &str = "1.3.6.1.2.1.2.2.1.17";

pub const IF_ALIAS: &str = "1.3.6.1.2.1.31.1.1.1.18";
pub const IF_HIGH_SPEED: &str = "1.3.6.1.2.1.31.1.1.1.15";
pub const IF_HC_IN_OCTETS: &str = "1.3.6.1.2.1.31.1.1.1.6";
pub const IF_HC_OUT_OCTETS: &str = "1.3.6.1.2.1.31.1.1.1.10";
pub const IF_IN_BROADCAST_PKTS: &str = "1.3.6.1.2.1.31.1.1.1.3";
pub const IF_IN_MULTICAST_PKTS: &str = "1.3.6.1.2.1.31.1.1.1.2";

pub const DOT1D_BASE_PORT_IF_INDEX: &str = "1.3.6.1.2.1.17.1.4.1.2";
pub const DOT1Q_TP_FDB_PORT: &str = "1.3.6.1.2.1.17.7.1.2.2.1.2";
pub const DOT1D_TP_FDB_PORT: &str = "1.3.6.1.2.1.17.4.3.1.2";
pub const IP_NET_TO_MEDIA_PHYS_ADDRESS: &str = "1.3.6.1.2.1.4.22.1.2";

/// APC rPDU2 (Gen2) tree.
pub mod apc_gen2 {
    pub const TOTAL_POWER_DECAWATTS: &str = "1.3.6.1.4.1.318.1.1.26.6.3.1.9.0";
    pub const TOTAL_ENERGY_KWH: &str = "1.3.6.1.4.1.318.1.1.26.6.3.1.6.0";
    pub const PHASE_VOLTAGE: &str = "1.3.6.1.4.1.318.1.1.26.6.3.1.3";
    pub const PHASE_CURRENT_TENTH_AMPS: &str = "1.3.6.1.4.1.318.1.1.26.6.3.1.4";
    pub const BANK_CURRENT_TENTH_AMPS: &str = "1.3.6.1.4.1.318.1.1.26.8.3.1.4";
    pub const BANK_OVERLOAD_THRESHOLD_TENTH_AMPS: &str = "1.3.6.1.4.1.318.1.1.26.8.3.1.8";
    pub const OUTLET_STATE: &str = "1.3.6.1.4.1.318.1.1.26.9.3.3.1.4";
    pub const OUTLET_BANK: &str = "1.3.6.1.4.1.318.1.1.26.9.3.3.1.3";
    pub const OUTLET_NAME: &str = "1.3.6.1.4.1.318.1.1.26.9.3.3.1.2";
    pub const TEMP_STATUS: &str = "1.3.6.1.4.1.318.1.1.26.10.2.1.2.1";
    pub const TEMP_TENTH_DEGREES_C: &str = "1.3.6.1.4.1.318.1.1.26.10.2.1.4.1";
    pub const HUMIDITY_STATUS: &str = "1.3.6.1.4.1.318.1.1.26.10.2.1.2.2";
    pub const HUMIDITY_PCT: &str = "1.3.6.1.4.1.318.1.1.26.10.2.1.4.2";
}

/// APC rPDU (Gen1) fallback tree.
pub mod apc_gen1 {
    pub const TOTAL_POWER_DECAWATTS: &str = "1.3.6.1.4.1.318.1.1.12.1.16.0";
    pub const OUTLET_STATE: &str = "1.3.6.1.4.1.318.1.1.12.3.5.1.1.4";
}

/// Arista MLAG MIB, used as the SNMP fallback when eAPI isn't reachable
/// (§4.2.2).
pub mod arista_mlag {
    pub const DOMAIN_ID: &str = "1.3.6.1.4.1.30065.3.16.1.1.0";
    pub const LOCAL_ROLE: &str = "1.3.6.1.4.1.30065.3.16.1.2.0";
    pub const PEER_LINK: &str = "1.3.6.1.4.1.30065.3.16.1.3.0";
    pub const CONFIG_SANITY: &str = "1.3.6.1.4.1.30065.3.16.1.4.0";
    pub const PORTS_CONFIGURED: &str = "1.3.6.1.4.1.30065.3.16.1.5.0";
    pub const PORTS_ACTIVE: &str = "1.3.6.1.4.1.30065.3.16.1.6.0";
    pub const PORTS_ERRDISABLED: &str = "1.3.6.1.4.1.30065.3.16.1.7.0";
    pub const INTERFACE_NAME: &str = "1.3.6.1.4.1.30065.3.16.2.1.1.2";
    pub const INTERFACE_LOCAL_STATUS: &str = "1.3.6.1.4.1.30065.3.16.2.1.1.3";
    pub const INTERFACE_REMOTE_STATUS: &str = "1.3.6.1.4.1.30065.3.16.2.1.1.4";
}
