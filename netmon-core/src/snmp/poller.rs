//! `poll_device` (§4.2): GET system health, walk the interface counter
//! table, and derive rate/utilization for every monitored interface.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use netmon_contracts::SnmpValue;
use netmon_model::{DeviceStatus, OperStatus};
use tracing::warn;

use crate::error::PollError;
use crate::snmp::client::SnmpTransport;
use crate::snmp::oids;
use crate::store::models::{Device, Interface, InterfaceMetric, PortStateChange};
use crate::store::ports::{DeviceRepository, InterfaceRepository, MetricsRepository};
use crate::store::Store;
use crate::system_event::SystemEventLogger;

type Result<T> = std::result::Result<T, PollError>;

pub struct PollOutcome {
    pub device_status: DeviceStatus,
    pub interfaces_updated: usize,
}

/// Counter-wrap correction (§4.2, boundary scenario 1). `current < previous`
/// is interpreted as a single wrap at the counter's own modulus unless it's
/// large enough that a wrap plus the observed delta would itself be
/// implausible, in which case the caller should treat it as a reboot and
/// emit rate=0. `hc` selects the modulus: HC (64-bit) counters wrap at
/// `2^64`, 32-bit fallback counters wrap at `2^32`.
pub fn wrapped_delta(previous: u64, current: u64, hc: bool) -> u64 {
    if current >= previous {
        current - previous
    } else if hc {
        current.wrapping_sub(previous)
    } else {
        (current as u32).wrapping_sub(previous as u32) as u64
    }
}

/// `in_delta*8/delta_secs`, guarding `delta_secs <= 0`.
pub fn bits_per_second(delta_bytes: u64, delta_secs: i64) -> f64 {
    if delta_secs <= 0 {
        return 0.0;
    }
    (delta_bytes as f64 * 8.0) / delta_secs as f64
}

pub fn utilization_pct(bps: f64, speed_bps: Option<i64>) -> f64 {
    match speed_bps {
        Some(speed) if speed > 0 => (bps / speed as f64 * 100.0).min(100.0).max(0.0),
        _ => 0.0,
    }
}

pub async fn poll_device(
    store: &Store,
    transport: &dyn SnmpTransport,
    device: &Device,
    timeout: Duration,
) -> Result<PollOutcome> {
    let logger = SystemEventLogger::new(&store.system_events, "snmp_poll");

    let uptime = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, oids::SYS_UPTIME, timeout)
        .await;

    let uptime = match uptime {
        Ok(Some(value)) => value.as_u64(),
        Ok(None) | Err(_) => None,
    };

    if uptime.is_none() {
        store
            .devices
            .update_health(device.id, DeviceStatus::Down, None, None, None, Utc::now())
            .await?;
        return Ok(PollOutcome { device_status: DeviceStatus::Down, interfaces_updated: 0 });
    }

    store
        .devices
        .update_health(
            device.id,
            DeviceStatus::Up,
            uptime.map(|t| (t / 100) as i64),
            device.cpu_usage,
            device.memory_usage,
            Utc::now(),
        )
        .await?;

    if device.device_type.is_pdu() {
        return Ok(PollOutcome { device_status: DeviceStatus::Up, interfaces_updated: 0 });
    }

    let (in_octets, hc) = walk_counter_table(transport, device, oids::IF_HC_IN_OCTETS, oids::IF_IN_OCTETS, timeout).await?;
    // Both directions live in the same ifXTable on the same device, so
    // whichever table answered for in_octets answers for out_octets too.
    let (out_octets, _) = walk_counter_table(transport, device, oids::IF_HC_OUT_OCTETS, oids::IF_OUT_OCTETS, timeout).await?;
    let oper_status = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, oids::IF_OPER_STATUS, timeout)
        .await
        .unwrap_or_default();
    let speeds = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, if hc { oids::IF_HIGH_SPEED } else { oids::IF_SPEED }, timeout)
        .await
        .unwrap_or_default();

    let monitored = store.interfaces.list_monitored_for_device(device.id).await?;
    let mut updated = 0usize;

    for iface in &monitored {
        let Some(if_index) = iface.if_index else { continue };
        let suffix = if_index.to_string();

        let Some(in_raw) = in_octets.get(&suffix).and_then(SnmpValue::as_u64) else { continue };
        let Some(out_raw) = out_octets.get(&suffix).and_then(SnmpValue::as_u64) else { continue };

        let new_oper = oper_status
            .get(&suffix)
            .and_then(SnmpValue::as_i64)
            .map(oper_status_from_snmp)
            .unwrap_or(iface.oper_status);

        let speed_bps = speeds.get(&suffix).and_then(SnmpValue::as_u64).map(|s| {
            if hc { (s as i64).saturating_mul(1_000_000) } else { s as i64 }
        });

        if let Err(err) = poll_one_interface(store, iface, in_raw, out_raw, new_oper, speed_bps, hc).await {
            warn!(device = %device.hostname, interface = %iface.name, %err, "failed to record interface metric");
            let _ = logger
                .warning("interface_poll_failed", "interface", &iface.id.to_string(), err.to_string())
                .await;
            continue;
        }
        updated += 1;
    }

    Ok(PollOutcome { device_status: DeviceStatus::Up, interfaces_updated: updated })
}

async fn walk_counter_table(
    transport: &dyn SnmpTransport,
    device: &Device,
    hc_oid: &str,
    fallback_oid: &str,
    timeout: Duration,
) -> Result<(BTreeMap<String, SnmpValue>, bool)> {
    let hc_result = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, hc_oid, timeout)
        .await
        .unwrap_or_default();

    if !hc_result.is_empty() {
        return Ok((hc_result, true));
    }

    let fallback = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, fallback_oid, timeout)
        .await?;
    Ok((fallback, false))
}

fn oper_status_from_snmp(value: i64) -> OperStatus {
    match value {
        1 => OperStatus::Up,
        2 => OperStatus::Down,
        3 => OperStatus::Testing,
        5 => OperStatus::Dormant,
        6 => OperStatus::NotPresent,
        7 => OperStatus::LowerLayerDown,
        _ => OperStatus::Unknown,
    }
}

async fn poll_one_interface(
    store: &Store,
    iface: &Interface,
    in_octets: u64,
    out_octets: u64,
    new_oper: OperStatus,
    speed_bps: Option<i64>,
    hc: bool,
) -> Result<()> {
    let now = Utc::now();
    let prev = store.metrics.latest_for_interface(iface.id).await?;
    let wrap_modulus_half = if hc { u64::MAX / 2 } else { (u32::MAX / 2) as u64 };

    let (in_bps, out_bps, in_delta, out_delta, delta_secs) = match &prev {
        Some(prev) => {
            let delta_secs = (now - prev.timestamp).num_seconds();
            if delta_secs <= 0 {
                (0.0, 0.0, 0, 0, delta_secs)
            } else {
                let in_delta = wrapped_delta(prev.in_octets, in_octets, hc);
                let out_delta = wrapped_delta(prev.out_octets, out_octets, hc);
                // A wrap this large relative to the interval implies a
                // reboot (counters reset to near zero) rather than a true
                // wrap; emit rate=0 instead of a spurious spike.
                let reboot_like = in_octets < prev.in_octets && in_delta > wrap_modulus_half;
                if reboot_like {
                    (0.0, 0.0, 0, 0, delta_secs)
                } else {
                    (
                        bits_per_second(in_delta, delta_secs),
                        bits_per_second(out_delta, delta_secs),
                        in_delta,
                        out_delta,
                        delta_secs,
                    )
                }
            }
        }
        None => (0.0, 0.0, 0, 0, 0),
    };

    if new_oper != iface.oper_status {
        store
            .interfaces
            .record_state_change(&PortStateChange {
                interface_id: iface.id,
                old_status: iface.oper_status,
                new_status: new_oper,
                changed_at: now,
            })
            .await?;
        store.interfaces.update_oper_status(iface.id, new_oper).await?;
    }

    let pps = if delta_secs > 0 {
        (in_delta + out_delta) as f64 / delta_secs as f64
    } else {
        0.0
    };

    store
        .metrics
        .insert(&InterfaceMetric {
            interface_id: iface.id,
            timestamp: now,
            in_octets,
            out_octets,
            in_packets: 0,
            out_packets: 0,
            in_errors: 0,
            out_errors: 0,
            in_discards: 0,
            out_discards: 0,
            in_broadcast: 0,
            in_multicast: 0,
            in_bps,
            out_bps,
            utilization_in: utilization_pct(in_bps, speed_bps),
            utilization_out: utilization_pct(out_bps, speed_bps),
            pps,
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_correction_matches_boundary_scenario() {
        let previous = 18_446_744_073_709_551_610u64;
        let current = 5u64;
        let delta = wrapped_delta(previous, current, true);
        assert_eq!(delta, 11);

        let bps = bits_per_second(delta, 60);
        assert!((bps - 1.466_666_7).abs() < 1e-4);
    }

    #[test]
    fn wrap_correction_uses_32_bit_modulus_for_fallback_counters() {
        let previous = 4_294_967_290u64; // u32::MAX - 5
        let current = 5u64;
        let delta = wrapped_delta(previous, current, false);
        assert_eq!(delta, 11);
    }

    #[test]
    fn utilization_is_clamped_to_100() {
        assert_eq!(utilization_pct(2_000_000_000.0, Some(1_000_000_000)), 100.0);
        assert_eq!(utilization_pct(0.0, Some(1_000_000_000)), 0.0);
        assert_eq!(utilization_pct(500.0, None), 0.0);
    }

    #[test]
    fn non_positive_interval_yields_zero_rate() {
        assert_eq!(bits_per_second(1000, 0), 0.0);
        assert_eq!(bits_per_second(1000, -5), 0.0);
    }
}
