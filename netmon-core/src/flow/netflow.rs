//! NetFlow v5 parsing (§4.3). 24-byte header followed by `count` fixed-size
//! records; rejects anything not version 5 or with a truncated trailing
//! record rather than panicking on malformed input.

use std::net::Ipv4Addr;

use nom::number::complete::be_u32;
use nom_derive::{Nom, Parse};

use crate::error::CollectorError;
use crate::flow::enrich::{detect_application, protocol_name};
use crate::store::models::FlowRecord;

#[derive(Debug, Nom)]
pub struct Header {
    pub version: u16,
    pub count: u16,
    pub sys_up_time_ms: u32,
    pub unix_secs: u32,
    pub unix_nsecs: u32,
    pub flow_sequence: u32,
    pub engine_type: u8,
    pub engine_id: u8,
    pub sampling_interval: u16,
}

#[derive(Debug, Nom)]
pub struct Record {
    #[nom(Map = "Ipv4Addr::from", Parse = "be_u32")]
    pub src_addr: Ipv4Addr,
    #[nom(Map = "Ipv4Addr::from", Parse = "be_u32")]
    pub dst_addr: Ipv4Addr,
    #[nom(Map = "Ipv4Addr::from", Parse = "be_u32")]
    pub next_hop: Ipv4Addr,
    pub input_if: u16,
    pub output_if: u16,
    pub d_pkts: u32,
    pub d_octets: u32,
    pub first: u32,
    pub last: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub pad1: u8,
    pub tcp_flags: u8,
    pub protocol: u8,
    pub tos: u8,
    pub src_as: u16,
    pub dst_as: u16,
    pub src_mask: u8,
    pub dst_mask: u8,
    pub pad2: u16,
}

/// Parses one datagram into zero or more [`FlowRecord`]s. Never errors on
/// malformed input past the header — truncated trailing records are simply
/// dropped, matching §4.3's "reject ... truncated records" without
/// aborting the whole datagram.
pub fn parse_datagram(data: &[u8]) -> Result<Vec<FlowRecord>, CollectorError> {
    let (rest, header) = Header::parse(data).map_err(|e| CollectorError::Malformed(e.to_string()))?;
    if header.version != 5 {
        return Err(CollectorError::UnsupportedVersion(header.version));
    }

    let mut records = Vec::with_capacity(header.count as usize);
    let mut remaining = rest;
    for _ in 0..header.count {
        let Ok((rest, record)) = Record::parse(remaining) else {
            break;
        };
        remaining = rest;
        records.push(to_flow_record(&record));
    }
    Ok(records)
}

fn to_flow_record(record: &Record) -> FlowRecord {
    let protocol_name = protocol_name(record.protocol);
    let application = detect_application(record.src_port, record.dst_port, record.protocol);
    let duration_ms = record.last.saturating_sub(record.first) as i64;

    FlowRecord {
        id: uuid::Uuid::now_v7(),
        device_id: None,
        timestamp: chrono::Utc::now(),
        src_ip: record.src_addr.into(),
        dst_ip: record.dst_addr.into(),
        src_port: record.src_port,
        dst_port: record.dst_port,
        protocol: record.protocol,
        protocol_name,
        bytes: record.d_octets as i64,
        packets: record.d_pkts as i64,
        duration_ms,
        tcp_flags: Some(record.tcp_flags),
        application: Some(application),
        flow_type: netmon_model::FlowType::NetflowV5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Write;

    /// §8 boundary scenario 2, byte-for-byte.
    fn minimal_datagram() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(5).unwrap(); // version
        buf.write_u16::<BigEndian>(1).unwrap(); // count
        buf.write_u32::<BigEndian>(1000).unwrap(); // sys_up_time
        buf.write_u32::<BigEndian>(1_700_000_000).unwrap(); // unix_secs
        buf.write_u32::<BigEndian>(0).unwrap(); // unix_nsecs
        buf.write_u32::<BigEndian>(0).unwrap(); // flow_sequence
        buf.write_u8(0).unwrap(); // engine_type
        buf.write_u8(0).unwrap(); // engine_id
        buf.write_u16::<BigEndian>(0).unwrap(); // sampling

        buf.write_all(&Ipv4Addr::new(10, 0, 0, 1).octets()).unwrap();
        buf.write_all(&Ipv4Addr::new(10, 0, 0, 2).octets()).unwrap();
        buf.write_all(&Ipv4Addr::new(0, 0, 0, 0).octets()).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap(); // input_if
        buf.write_u16::<BigEndian>(0).unwrap(); // output_if
        buf.write_u32::<BigEndian>(10).unwrap(); // d_pkts
        buf.write_u32::<BigEndian>(1500).unwrap(); // d_octets
        buf.write_u32::<BigEndian>(500).unwrap(); // first
        buf.write_u32::<BigEndian>(900).unwrap(); // last
        buf.write_u16::<BigEndian>(443).unwrap(); // src_port
        buf.write_u16::<BigEndian>(54321).unwrap(); // dst_port
        buf.write_u8(0).unwrap(); // pad1
        buf.write_u8(0).unwrap(); // tcp_flags
        buf.write_u8(6).unwrap(); // protocol
        buf.write_u8(0).unwrap(); // tos
        buf.write_u16::<BigEndian>(0).unwrap(); // src_as
        buf.write_u16::<BigEndian>(0).unwrap(); // dst_as
        buf.write_u8(0).unwrap(); // src_mask
        buf.write_u8(0).unwrap(); // dst_mask
        buf.write_u16::<BigEndian>(0).unwrap(); // pad2
        buf
    }

    #[test]
    fn boundary_scenario_netflow_v5_minimal() {
        let records = parse_datagram(&minimal_datagram()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.protocol_name, "TCP");
        assert_eq!(r.application.as_deref(), Some("HTTPS"));
        assert_eq!(r.bytes, 1500);
        assert_eq!(r.packets, 10);
        assert_eq!(r.duration_ms, 400);
        assert_eq!(r.flow_type, netmon_model::FlowType::NetflowV5);
    }

    #[test]
    fn rejects_non_v5() {
        let mut data = minimal_datagram();
        data[0] = 0;
        data[1] = 9;
        let err = parse_datagram(&data).unwrap_err();
        assert!(matches!(err, CollectorError::UnsupportedVersion(9)));
    }

    #[test]
    fn truncated_trailing_record_is_dropped_not_fatal() {
        let mut data = minimal_datagram();
        data.truncate(data.len() - 5);
        let records = parse_datagram(&data).unwrap();
        assert!(records.is_empty());
    }
}
