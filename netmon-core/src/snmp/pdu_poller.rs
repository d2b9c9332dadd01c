//! APC PDU sub-poller (§4.2.1). Tries the Gen2 (rPDU2) tree first, falls
//! back to Gen1 on absence.

use std::time::Duration;

use chrono::Utc;
use netmon_contracts::SnmpValue;

use crate::error::PollError;
use crate::snmp::client::SnmpTransport;
use crate::snmp::oids::{apc_gen1, apc_gen2};
use crate::store::models::{Device, PduBank, PduBankMetric, PduMetric, PduOutlet};
use crate::store::ports::PduRepository;
use crate::store::Store;

type Result<T> = std::result::Result<T, PollError>;

pub async fn poll_pdu(store: &Store, transport: &dyn SnmpTransport, device: &Device, timeout: Duration) -> Result<()> {
    let gen2_power = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::TOTAL_POWER_DECAWATTS, timeout)
        .await
        .ok()
        .flatten();

    if let Some(power) = gen2_power {
        poll_gen2(store, transport, device, timeout, power).await
    } else {
        poll_gen1(store, transport, device, timeout).await
    }
}

async fn poll_gen2(
    store: &Store,
    transport: &dyn SnmpTransport,
    device: &Device,
    timeout: Duration,
    total_power_decawatts: SnmpValue,
) -> Result<()> {
    let total_power_watts = total_power_decawatts.as_u64().unwrap_or(0) as f64 * 10.0;

    let energy = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::TOTAL_ENERGY_KWH, timeout)
        .await
        .ok()
        .flatten()
        .and_then(|v| v.as_u64())
        .map(|v| v as f64 / 10.0);

    let voltages = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::PHASE_VOLTAGE, timeout)
        .await
        .unwrap_or_default();
    let currents = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::PHASE_CURRENT_TENTH_AMPS, timeout)
        .await
        .unwrap_or_default();

    let mut apparent_power_va = 0.0;
    let mut phase_count = 0u32;
    for (idx, current_raw) in &currents {
        let amps = current_raw.as_u64().unwrap_or(0) as f64 / 10.0;
        let volts = voltages.get(idx).and_then(SnmpValue::as_u64).unwrap_or(0) as f64;
        apparent_power_va += volts * amps;
        phase_count += 1;
    }

    let power_factor = if apparent_power_va > 0.0 {
        Some(total_power_watts / apparent_power_va)
    } else {
        None
    };

    let bank_currents = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::BANK_CURRENT_TENTH_AMPS, timeout)
        .await
        .unwrap_or_default();
    let bank_thresholds = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::BANK_OVERLOAD_THRESHOLD_TENTH_AMPS, timeout)
        .await
        .unwrap_or_default();

    let avg_voltage = if phase_count > 0 {
        voltages.values().filter_map(SnmpValue::as_u64).sum::<u64>() as f64 / phase_count as f64
    } else {
        0.0
    };

    let mut load_pct = None;
    let now = Utc::now();
    for (bank_str, current_raw) in &bank_currents {
        let Ok(bank_number) = bank_str.parse::<i32>() else { continue };
        let amps = current_raw.as_u64().unwrap_or(0) as f64 / 10.0;
        let threshold_amps = bank_thresholds.get(bank_str).and_then(SnmpValue::as_u64).unwrap_or(0) as f64 / 10.0;

        store
            .pdu
            .upsert_bank(&PduBank { device_id: device.id, number: bank_number, overload_threshold_amps: threshold_amps })
            .await?;

        let rated_watts = threshold_amps * avg_voltage * phase_count.max(1) as f64;
        let bank_power_watts = amps * avg_voltage;
        if rated_watts > 0.0 {
            load_pct = Some((bank_power_watts / rated_watts * 100.0).min(100.0));
        }

        store
            .pdu
            .insert_bank_metric(&PduBankMetric {
                device_id: device.id,
                bank_number,
                timestamp: now,
                current_amps: amps,
                power_watts: bank_power_watts,
            })
            .await?;
    }

    let outlet_states = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::OUTLET_STATE, timeout)
        .await
        .unwrap_or_default();
    let outlet_banks = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::OUTLET_BANK, timeout)
        .await
        .unwrap_or_default();
    let outlet_names = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::OUTLET_NAME, timeout)
        .await
        .unwrap_or_default();

    for (outlet_str, state_raw) in &outlet_states {
        let Ok(number) = outlet_str.parse::<i32>() else { continue };
        let state = outlet_state_from_raw(state_raw.as_i64().unwrap_or(0));
        let bank_number = outlet_banks.get(outlet_str).and_then(SnmpValue::as_i64).map(|v| v as i32);
        let name = outlet_names.get(outlet_str).and_then(|v| v.as_str());

        store
            .pdu
            .upsert_outlet(&PduOutlet { device_id: device.id, number, name, state, bank_number })
            .await?;
    }

    let temp_ok = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::TEMP_STATUS, timeout)
        .await
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
        == Some(1);
    let temperature_c = if temp_ok {
        transport
            .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::TEMP_TENTH_DEGREES_C, timeout)
            .await
            .ok()
            .flatten()
            .and_then(|v| v.as_u64())
            .map(|v| v as f64 / 10.0)
    } else {
        None
    };

    let humidity_ok = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::HUMIDITY_STATUS, timeout)
        .await
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
        == Some(1);
    let humidity_pct = if humidity_ok {
        transport
            .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen2::HUMIDITY_PCT, timeout)
            .await
            .ok()
            .flatten()
            .and_then(|v| v.as_u64())
            .map(|v| v as f64)
    } else {
        None
    };

    store
        .pdu
        .insert_metric(&PduMetric {
            device_id: device.id,
            timestamp: now,
            total_power_watts,
            total_energy_kwh: energy,
            apparent_power_va,
            power_factor,
            load_pct,
            temperature_c,
            humidity_pct,
        })
        .await?;

    Ok(())
}

async fn poll_gen1(store: &Store, transport: &dyn SnmpTransport, device: &Device, timeout: Duration) -> Result<()> {
    let power = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, apc_gen1::TOTAL_POWER_DECAWATTS, timeout)
        .await?;

    let Some(power) = power else {
        return Err(PollError::NotPresent);
    };
    let total_power_watts = power.as_u64().unwrap_or(0) as f64 * 10.0;

    let outlet_states = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, apc_gen1::OUTLET_STATE, timeout)
        .await
        .unwrap_or_default();

    for (outlet_str, state_raw) in &outlet_states {
        let Ok(number) = outlet_str.parse::<i32>() else { continue };
        let state = outlet_state_from_raw(state_raw.as_i64().unwrap_or(0));
        store
            .pdu
            .upsert_outlet(&PduOutlet { device_id: device.id, number, name: None, state, bank_number: None })
            .await?;
    }

    store
        .pdu
        .insert_metric(&PduMetric {
            device_id: device.id,
            timestamp: Utc::now(),
            total_power_watts,
            total_energy_kwh: None,
            apparent_power_va: total_power_watts,
            power_factor: None,
            load_pct: None,
            temperature_c: None,
            humidity_pct: None,
        })
        .await?;

    Ok(())
}

/// APC rPDU2 outlet states: 1=on, 2=off. Gen2 adds >=3 metered-only variants
/// that still mean the outlet is energized.
fn outlet_state_from_raw(raw: i64) -> netmon_model::OutletState {
    match raw {
        1 => netmon_model::OutletState::On,
        2 => netmon_model::OutletState::Off,
        n if n >= 3 => netmon_model::OutletState::On,
        _ => netmon_model::OutletState::MeteredOnly,
    }
}
