//! MAC address table discovery (§4.2.2). Prefers Q-BRIDGE-MIB (per-VLAN
//! community indexing is out of scope here — devices expose the vlan-aware
//! table directly where supported) and falls back to BRIDGE-MIB; bridge
//! ports are mapped to ifIndex via `dot1dBasePortIfIndex`, then enriched
//! with ARP.

use std::time::Duration;

use chrono::Utc;
use netmon_contracts::SnmpValue;

use crate::error::PollError;
use crate::snmp::client::SnmpTransport;
use crate::snmp::oids;
use crate::store::models::Device;
use crate::store::ports::MacDiscoveryRepository;
use crate::store::Store;

type Result<T> = std::result::Result<T, PollError>;

/// Minimal built-in OUI→vendor table; the original kept a larger embedded
/// list, but the lookup contract (first 3 octets, colon-separated, upper
/// case) is what callers depend on.
const OUI_TABLE: &[(&str, &str)] = &[
    ("00:1A:A0", "Cisco"),
    ("00:0C:29", "VMware"),
    ("A4:77:33", "Arista Networks"),
    ("00:50:56", "VMware"),
    ("B8:27:EB", "Raspberry Pi Foundation"),
];

fn vendor_for_mac(mac: &str) -> Option<&'static str> {
    let prefix = mac.get(0..8)?.to_ascii_uppercase();
    OUI_TABLE.iter().find(|(oui, _)| *oui == prefix).map(|(_, vendor)| *vendor)
}

pub async fn discover_mac_table(store: &Store, transport: &dyn SnmpTransport, device: &Device, timeout: Duration) -> Result<usize> {
    let base_port_if_index = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, oids::DOT1D_BASE_PORT_IF_INDEX, timeout)
        .await
        .unwrap_or_default();

    let mut fdb = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, oids::DOT1Q_TP_FDB_PORT, timeout)
        .await
        .unwrap_or_default();
    if fdb.is_empty() {
        fdb = transport
            .walk(device.ip_address, device.snmp_port, &device.snmp, oids::DOT1D_TP_FDB_PORT, timeout)
            .await
            .unwrap_or_default();
    }

    let arp = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, oids::IP_NET_TO_MEDIA_PHYS_ADDRESS, timeout)
        .await
        .unwrap_or_default();
    let mac_to_ip = build_mac_to_ip_index(&arp);

    let now = Utc::now();
    let mut discovered = 0usize;

    for (suffix, bridge_port_raw) in &fdb {
        let mac = suffix_to_mac(suffix);
        let Some(mac) = mac else { continue };

        let bridge_port = bridge_port_raw.as_u64();
        let if_index = bridge_port
            .and_then(|port| base_port_if_index.get(&port.to_string()))
            .and_then(SnmpValue::as_i64)
            .map(|v| v as i32);

        let vlan_id = suffix.split('.').next().and_then(|s| s.parse::<i32>().ok());
        let ip_address = mac_to_ip.get(&mac).copied();
        let vendor = vendor_for_mac(&mac);

        store
            .mac
            .upsert_mac_entry(device.id, &mac, if_index, vlan_id, ip_address, vendor, now)
            .await?;
        discovered += 1;
    }

    Ok(discovered)
}

fn suffix_to_mac(suffix: &str) -> Option<String> {
    let octets: Vec<&str> = suffix.rsplit('.').take(6).collect();
    if octets.len() != 6 {
        return None;
    }
    let octets: Vec<u8> = octets.into_iter().rev().filter_map(|s| s.parse::<u16>().ok()).map(|v| v as u8).collect();
    if octets.len() != 6 {
        return None;
    }
    Some(octets.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(":"))
}

fn build_mac_to_ip_index(arp: &std::collections::BTreeMap<String, SnmpValue>) -> std::collections::HashMap<String, std::net::IpAddr> {
    let mut index = std::collections::HashMap::new();
    for (suffix, value) in arp {
        let SnmpValue::OctetString(bytes) = value else { continue };
        if bytes.len() != 6 {
            continue;
        }
        let mac = bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(":");
        // `ipNetToMediaPhysAddress` is indexed by `ifIndex.ipAddress`; the IP
        // octets are the last 4 dotted components of the suffix.
        let ip_parts: Vec<&str> = suffix.rsplit('.').take(4).collect();
        if ip_parts.len() == 4 {
            let dotted = ip_parts.into_iter().rev().collect::<Vec<_>>().join(".");
            if let Ok(ip) = dotted.parse::<std::net::IpAddr>() {
                index.insert(mac, ip);
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_lookup_matches_known_oui() {
        assert_eq!(vendor_for_mac("a4:77:33:11:22:33"), Some("Arista Networks"));
        assert_eq!(vendor_for_mac("ff:ff:ff:00:00:00"), None);
    }
}
