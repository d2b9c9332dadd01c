//! MLAG/vPC discovery (§4.2.2). Arista eAPI (`show mlag`, `show mlag
//! interfaces` over the JSON-RPC `command-api` endpoint) is tried first;
//! the Arista MLAG MIB is the SNMP fallback. Any other vendor simply never
//! reports a domain, which is treated the same as "no MLAG observed".

use std::time::Duration;

use chrono::Utc;
use netmon_contracts::SnmpValue;
use serde::Deserialize;
use serde_json::json;

use crate::error::PollError;
use crate::snmp::client::SnmpTransport;
use crate::snmp::oids::arista_mlag;
use crate::store::models::{Device, MlagDomain, MlagInterface};
use crate::store::ports::MlagRepository;
use crate::store::Store;

type Result<T> = std::result::Result<T, PollError>;

struct Observed {
    domain_id: String,
    peer_state: String,
    interfaces: Vec<MlagInterface>,
}

pub async fn discover_mlag(
    store: &Store,
    transport: &dyn SnmpTransport,
    http: &reqwest::Client,
    device: &Device,
    timeout: Duration,
) -> Result<bool> {
    let observed = match try_eapi(http, device, timeout).await {
        Some(o) => Some(o),
        None => try_snmp(transport, device, timeout).await?,
    };

    let Some(observed) = observed else {
        store.mlag.delete_domain(device.id).await?;
        return Ok(false);
    };

    let domain = MlagDomain {
        device_id: device.id,
        domain_id: observed.domain_id,
        peer_address: None,
        peer_state: observed.peer_state,
        updated_at: Utc::now(),
    };
    store.mlag.replace_domain(&domain, &observed.interfaces).await?;
    Ok(true)
}

#[derive(Deserialize)]
struct EapiResponse {
    result: Option<Vec<serde_json::Value>>,
}

async fn try_eapi(http: &reqwest::Client, device: &Device, timeout: Duration) -> Option<Observed> {
    let username = device.api_username.as_ref()?;

    let url = format!("https://{}/command-api", device.ip_address);
    let payload = json!({
        "jsonrpc": "2.0",
        "method": "runCmds",
        "params": { "version": 1, "cmds": ["show mlag", "show mlag interfaces"] },
        "id": "netmon-mlag",
    });

    let resp = http
        .post(&url)
        .basic_auth(username, device.api_password_encrypted.as_deref())
        .json(&payload)
        .timeout(timeout)
        .send()
        .await
        .ok()?;

    if !resp.status().is_success() {
        return None;
    }

    let body: EapiResponse = resp.json().await.ok()?;
    let results = body.result?;
    let mlag = results.first()?;
    let ifaces = results.get(1);

    let state = mlag.get("state").and_then(|v| v.as_str()).unwrap_or("disabled");
    if state == "disabled" {
        return None;
    }

    let domain_id = mlag.get("domainId").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let peer_state = if mlag.get("peerLinkStatus").and_then(|v| v.as_str()) == Some("up") {
        "active".to_string()
    } else {
        "inactive".to_string()
    };

    let mut interfaces = Vec::new();
    if let Some(detail) = ifaces.and_then(|v| v.get("interfaces")).and_then(|v| v.as_object()) {
        for (mlag_id_str, info) in detail {
            let mlag_id = mlag_id_str.replace("Mlag", "").parse::<i32>().unwrap_or(0);
            interfaces.push(MlagInterface {
                device_id: device.id,
                local_interface: info.get("localInterface").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                peer_interface: info.get("peerInterface").and_then(|v| v.as_str()).map(str::to_string),
                mlag_id,
                state: info.get("localInterfaceStatus").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
            });
        }
    }

    Some(Observed { domain_id, peer_state, interfaces })
}

async fn try_snmp(transport: &dyn SnmpTransport, device: &Device, timeout: Duration) -> Result<Option<Observed>> {
    let domain_id = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, arista_mlag::DOMAIN_ID, timeout)
        .await?;
    let Some(domain_id) = domain_id.and_then(|v| v.as_str()) else {
        return Ok(None);
    };

    let peer_link = transport
        .get(device.ip_address, device.snmp_port, &device.snmp, arista_mlag::PEER_LINK, timeout)
        .await
        .ok()
        .flatten();
    let peer_state = if peer_link.is_some() { "active".to_string() } else { "unknown".to_string() };

    let names = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, arista_mlag::INTERFACE_NAME, timeout)
        .await
        .unwrap_or_default();
    let local_status = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, arista_mlag::INTERFACE_LOCAL_STATUS, timeout)
        .await
        .unwrap_or_default();
    let remote_status = transport
        .walk(device.ip_address, device.snmp_port, &device.snmp, arista_mlag::INTERFACE_REMOTE_STATUS, timeout)
        .await
        .unwrap_or_default();

    let mut interfaces = Vec::new();
    for (suffix, name) in &names {
        let mlag_id = suffix.rsplit('.').next().and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);
        let local_interface = name.as_str().unwrap_or_default().to_string();
        let local = local_status.get(suffix).and_then(SnmpValue::as_str).unwrap_or_else(|| "unknown".to_string());
        let remote = remote_status.get(suffix).and_then(SnmpValue::as_str);

        interfaces.push(MlagInterface {
            device_id: device.id,
            local_interface,
            peer_interface: None,
            mlag_id,
            state: remote.unwrap_or(local),
        });
    }

    Ok(Some(Observed { domain_id, peer_state, interfaces }))
}
