//! ICMP RTT/loss probe (§4.6 Ping Monitor): one probe run per active
//! device per scheduler tick, writing a [`PingMetric`] row and refreshing
//! the device's latest-RTT/packet-loss snapshot.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use chrono::Utc;
use netmon_config::PingConfig;
use surge_ping::{Client, Config as PingClientConfig, IcmpPacket, PingIdentifier, PingSequence};
use tracing::debug;

use crate::store::models::{PingMetric, PingStatus};
use crate::store::ports::{DeviceRepository, PingRepository};
use crate::store::Store;

/// Matches `ping_monitor.py`'s default echo count.
const ECHOES_PER_PROBE: u16 = 5;
const PAYLOAD: [u8; 56] = [0u8; 56];

static NEXT_IDENT: AtomicU16 = AtomicU16::new(1);

struct ProbeResult {
    rtt_min_ms: Option<f64>,
    rtt_avg_ms: Option<f64>,
    rtt_max_ms: Option<f64>,
    packets_sent: i32,
    packets_received: i32,
    loss_pct: f64,
}

/// Builds the ICMP client used for every probe in this process; callers
/// share one instance rather than opening a raw socket per device.
pub fn build_client() -> anyhow::Result<Client> {
    Ok(Client::new(&PingClientConfig::default())?)
}

async fn probe(client: &Client, ip: IpAddr, timeout: Duration) -> ProbeResult {
    let ident = PingIdentifier(NEXT_IDENT.fetch_add(1, Ordering::Relaxed));
    let mut pinger = client.pinger(ip, ident).await;
    pinger.timeout(timeout);

    let mut rtts = Vec::with_capacity(ECHOES_PER_PROBE as usize);
    for seq in 0..ECHOES_PER_PROBE {
        match pinger.ping(PingSequence(seq), &PAYLOAD).await {
            Ok((IcmpPacket::V4(_), rtt)) | Ok((IcmpPacket::V6(_), rtt)) => {
                rtts.push(rtt.as_secs_f64() * 1000.0);
            }
            Err(err) => {
                debug!(%ip, seq, error = %err, "ping echo failed");
            }
        }
    }

    let sent = ECHOES_PER_PROBE as i32;
    let received = rtts.len() as i32;
    let loss_pct = ((sent - received) as f64 / sent as f64) * 100.0;

    if rtts.is_empty() {
        return ProbeResult {
            rtt_min_ms: None,
            rtt_avg_ms: None,
            rtt_max_ms: None,
            packets_sent: sent,
            packets_received: received,
            loss_pct,
        };
    }

    let rtt_min_ms = rtts.iter().cloned().fold(f64::INFINITY, f64::min);
    let rtt_max_ms = rtts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let rtt_avg_ms = rtts.iter().sum::<f64>() / rtts.len() as f64;

    ProbeResult {
        rtt_min_ms: Some(rtt_min_ms),
        rtt_avg_ms: Some(rtt_avg_ms),
        rtt_max_ms: Some(rtt_max_ms),
        packets_sent: sent,
        packets_received: received,
        loss_pct,
    }
}

/// Probes every active device and persists both the time-series row and
/// the device's latest-snapshot fields.
pub async fn ping_all_devices(store: &Store, client: &Client, _config: &PingConfig, timeout: Duration) -> anyhow::Result<()> {
    let devices = store.devices.list_active().await?;
    let now = Utc::now();

    for device in devices {
        let result = probe(client, device.ip_address, timeout).await;
        let status = PingStatus::from_loss_pct(result.loss_pct);

        store
            .ping
            .insert(&PingMetric {
                device_id: device.id,
                timestamp: now,
                rtt_min_ms: result.rtt_min_ms,
                rtt_avg_ms: result.rtt_avg_ms,
                rtt_max_ms: result.rtt_max_ms,
                packet_loss_pct: result.loss_pct,
                packets_sent: result.packets_sent,
                packets_received: result.packets_received,
                status,
            })
            .await?;

        store.devices.update_ping_stats(device.id, result.rtt_avg_ms, result.loss_pct).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_thresholds_match_reference_behavior() {
        assert_eq!(PingStatus::from_loss_pct(0.0), PingStatus::Ok);
        assert_eq!(PingStatus::from_loss_pct(40.0), PingStatus::Loss);
        assert_eq!(PingStatus::from_loss_pct(100.0), PingStatus::Timeout);
    }
}
