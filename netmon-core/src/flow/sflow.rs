//! sFlow v5 parsing (§4.3). Unlike NetFlow v5's fixed-size records, sFlow
//! datagrams nest variably-sized samples and records, so this is parsed
//! imperatively with explicit offsets (`nom-derive`'s static layout doesn't
//! fit) rather than a derived struct.

use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use tracing::debug;

use crate::flow::enrich::{detect_application, protocol_name};
use crate::store::models::FlowRecord;

const RAW_PACKET_HEADER: u32 = 1;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;

/// Parses one sFlow v5 datagram. Unsupported versions, agent address
/// types, or truncated samples cause the rest of the datagram to be
/// abandoned rather than panicking; counter samples (format 2/4) are
/// skipped silently since they are expected traffic, not an error.
pub fn parse_datagram(data: &[u8]) -> Vec<FlowRecord> {
    if data.len() < 28 {
        debug!(len = data.len(), "sFlow datagram too short");
        return Vec::new();
    }

    let mut cursor = Cursor::new(data);
    let Ok(version) = cursor.read_u32::<BigEndian>() else {
        return Vec::new();
    };
    if version != 5 {
        debug!(version, "sFlow: unsupported version");
        return Vec::new();
    }

    let Ok(agent_address_type) = cursor.read_u32::<BigEndian>() else {
        return Vec::new();
    };
    let skip = match agent_address_type {
        1 => 4,
        2 => 16,
        other => {
            debug!(agent_address_type = other, "sFlow: unsupported agent address type");
            return Vec::new();
        }
    };
    if skip_bytes(&mut cursor, skip).is_err() {
        return Vec::new();
    }
    // sub_agent_id + sequence_number + uptime
    if skip_bytes(&mut cursor, 12).is_err() {
        return Vec::new();
    }

    let Ok(num_samples) = cursor.read_u32::<BigEndian>() else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for _ in 0..num_samples {
        let (Ok(sample_type), Ok(sample_len)) =
            (cursor.read_u32::<BigEndian>(), cursor.read_u32::<BigEndian>())
        else {
            break;
        };

        let sample_start = cursor.position();
        let sample_end = sample_start + sample_len as u64;
        if sample_end > data.len() as u64 {
            break;
        }

        let enterprise = sample_type >> 12;
        let format = sample_type & 0xFFF;
        let sample_bytes = &data[sample_start as usize..sample_end as usize];

        if enterprise == 0 && (format == 1 || format == 3) {
            records.extend(parse_flow_sample(sample_bytes, format == 3));
        } else if enterprise == 0 && (format == 2 || format == 4) {
            // counter sample, expected and silently skipped.
        } else {
            debug!(enterprise, format, "sFlow: unknown sample type");
        }

        cursor.set_position(sample_end);
    }

    records
}

fn skip_bytes(cursor: &mut Cursor<&[u8]>, n: u64) -> std::io::Result<()> {
    let mut buf = vec![0u8; n as usize];
    cursor.read_exact(&mut buf)
}

fn parse_flow_sample(data: &[u8], expanded: bool) -> Vec<FlowRecord> {
    let min_size = if expanded { 32 } else { 28 };
    if data.len() < min_size {
        return Vec::new();
    }

    let mut cursor = Cursor::new(data);
    // sequence_number
    if skip_bytes(&mut cursor, 4).is_err() {
        return Vec::new();
    }
    let source_skip = if expanded { 8 } else { 4 };
    if skip_bytes(&mut cursor, source_skip).is_err() {
        return Vec::new();
    }

    let Ok(sampling_rate) = cursor.read_u32::<BigEndian>() else {
        return Vec::new();
    };
    // sample_pool + drops
    if skip_bytes(&mut cursor, 8).is_err() {
        return Vec::new();
    }
    let if_skip = if expanded { 16 } else { 8 };
    if skip_bytes(&mut cursor, if_skip).is_err() {
        return Vec::new();
    }

    let Ok(num_records) = cursor.read_u32::<BigEndian>() else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for _ in 0..num_records {
        let (Ok(record_type), Ok(record_len)) =
            (cursor.read_u32::<BigEndian>(), cursor.read_u32::<BigEndian>())
        else {
            break;
        };

        let record_start = cursor.position();
        let record_end = record_start + record_len as u64;
        if record_end > data.len() as u64 {
            break;
        }

        let enterprise = record_type >> 12;
        let format = record_type & 0xFFF;
        if enterprise == 0 && format == RAW_PACKET_HEADER {
            let record_bytes = &data[record_start as usize..record_end as usize];
            if let Some(record) = parse_raw_header(record_bytes, sampling_rate) {
                records.push(record);
            }
        }
        cursor.set_position(record_end);
    }
    records
}

fn parse_raw_header(data: &[u8], sampling_rate: u32) -> Option<FlowRecord> {
    if data.len() < 16 {
        return None;
    }
    let mut cursor = Cursor::new(data);
    let header_protocol = cursor.read_u32::<BigEndian>().ok()?;
    let frame_length = cursor.read_u32::<BigEndian>().ok()?;
    cursor.read_u32::<BigEndian>().ok()?; // stripped
    let header_size = cursor.read_u32::<BigEndian>().ok()? as usize;

    let header_start = cursor.position() as usize;
    let header_end = (header_start + header_size).min(data.len());
    let header_data = &data[header_start..header_end];

    match header_protocol {
        1 => parse_ethernet(header_data, frame_length, sampling_rate),
        11 => parse_ipv4(header_data, 0, frame_length, sampling_rate),
        _ => None,
    }
}

fn parse_ethernet(data: &[u8], frame_length: u32, sampling_rate: u32) -> Option<FlowRecord> {
    if data.len() < 14 {
        return None;
    }
    let ethertype = u16::from_be_bytes([data[12], data[13]]);
    match ethertype {
        ETHERTYPE_IPV4 => parse_ipv4(data, 14, frame_length, sampling_rate),
        ETHERTYPE_IPV6 => parse_ipv6(data, 14, frame_length, sampling_rate),
        _ => None,
    }
}

fn parse_ipv4(data: &[u8], offset: usize, frame_length: u32, sampling_rate: u32) -> Option<FlowRecord> {
    if data.len() < offset + 20 {
        return None;
    }
    let ihl = (data[offset] & 0x0F) as usize * 4;
    let protocol = data[offset + 9];
    let src_ip = Ipv4Addr::new(data[offset + 12], data[offset + 13], data[offset + 14], data[offset + 15]);
    let dst_ip = Ipv4Addr::new(data[offset + 16], data[offset + 17], data[offset + 18], data[offset + 19]);

    let (src_port, dst_port, tcp_flags) = transport_header(data, offset + ihl, protocol);

    Some(build_record(src_ip.into(), dst_ip.into(), src_port, dst_port, protocol, tcp_flags, frame_length, sampling_rate))
}

fn parse_ipv6(data: &[u8], offset: usize, frame_length: u32, sampling_rate: u32) -> Option<FlowRecord> {
    if data.len() < offset + 40 {
        return None;
    }
    let protocol = data[offset + 6];
    let mut src_octets = [0u8; 16];
    let mut dst_octets = [0u8; 16];
    src_octets.copy_from_slice(&data[offset + 8..offset + 24]);
    dst_octets.copy_from_slice(&data[offset + 24..offset + 40]);
    let src_ip = Ipv6Addr::from(src_octets);
    let dst_ip = Ipv6Addr::from(dst_octets);

    let (src_port, dst_port, tcp_flags) = transport_header(data, offset + 40, protocol);

    Some(build_record(src_ip.into(), dst_ip.into(), src_port, dst_port, protocol, tcp_flags, frame_length, sampling_rate))
}

/// TCP/UDP source+dest ports, plus TCP flags when the transport is TCP.
fn transport_header(data: &[u8], offset: usize, protocol: u8) -> (u16, u16, u8) {
    if !matches!(protocol, 6 | 17) || data.len() < offset + 4 {
        return (0, 0, 0);
    }
    let src_port = u16::from_be_bytes([data[offset], data[offset + 1]]);
    let dst_port = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
    let tcp_flags = if protocol == 6 && data.len() >= offset + 14 { data[offset + 13] } else { 0 };
    (src_port, dst_port, tcp_flags)
}

/// §8 boundary scenario: `packets = rate`, `bytes = frame_length * rate`,
/// where `rate = max(sampling_rate, 1)` so an unsampled (rate=0) exporter
/// still counts as 1:1.
fn build_record(
    src_ip: std::net::IpAddr,
    dst_ip: std::net::IpAddr,
    src_port: u16,
    dst_port: u16,
    protocol: u8,
    tcp_flags: u8,
    frame_length: u32,
    sampling_rate: u32,
) -> FlowRecord {
    let rate = sampling_rate.max(1) as i64;
    FlowRecord {
        id: uuid::Uuid::now_v7(),
        device_id: None,
        timestamp: chrono::Utc::now(),
        src_ip,
        dst_ip,
        src_port,
        dst_port,
        protocol,
        protocol_name: protocol_name(protocol),
        bytes: frame_length as i64 * rate,
        packets: rate,
        duration_ms: 0,
        tcp_flags: Some(tcp_flags),
        application: Some(detect_application(src_port, dst_port, protocol)),
        flow_type: netmon_model::FlowType::Sflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn push_flow_sample(buf: &mut Vec<u8>, sampling_rate: u32, ethernet_frame: &[u8]) {
        let mut sample = Vec::new();
        sample.write_u32::<BigEndian>(0).unwrap(); // sequence_number
        sample.write_u32::<BigEndian>(1).unwrap(); // source_id
        sample.write_u32::<BigEndian>(sampling_rate).unwrap();
        sample.write_u64::<BigEndian>(0).unwrap(); // sample_pool + drops
        sample.write_u32::<BigEndian>(0).unwrap(); // input_if
        sample.write_u32::<BigEndian>(0).unwrap(); // output_if
        sample.write_u32::<BigEndian>(1).unwrap(); // num_records

        let mut header = Vec::new();
        header.write_u32::<BigEndian>(1).unwrap(); // header_protocol=ethernet
        header.write_u32::<BigEndian>(ethernet_frame.len() as u32).unwrap(); // frame_length
        header.write_u32::<BigEndian>(0).unwrap(); // stripped
        header.write_u32::<BigEndian>(ethernet_frame.len() as u32).unwrap(); // header_size
        header.write_all(ethernet_frame).unwrap();

        sample.write_u32::<BigEndian>(1).unwrap(); // record_type = raw packet header
        sample.write_u32::<BigEndian>(header.len() as u32).unwrap();
        sample.write_all(&header).unwrap();

        buf.write_u32::<BigEndian>(1).unwrap(); // sample_type = (enterprise 0, format 1)
        buf.write_u32::<BigEndian>(sample.len() as u32).unwrap();
        buf.write_all(&sample).unwrap();
    }

    fn ethernet_ipv4_udp_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 14]; // dst mac + src mac
        frame[12] = 0x08;
        frame[13] = 0x00; // ethertype IPv4
        let mut ip = vec![0u8; 20];
        ip[0] = 0x45; // version/IHL
        ip[9] = 17; // UDP
        ip[12..16].copy_from_slice(&Ipv4Addr::new(192, 168, 1, 10).octets());
        ip[16..20].copy_from_slice(&Ipv4Addr::new(192, 168, 1, 20).octets());
        frame.extend_from_slice(&ip);
        let mut udp = vec![0u8; 8];
        udp[0..2].copy_from_slice(&500u16.to_be_bytes());
        udp[2..4].copy_from_slice(&53u16.to_be_bytes());
        frame.extend_from_slice(&udp);
        frame
    }

    fn wrap_datagram(samples: Vec<u8>, num_samples: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u32::<BigEndian>(5).unwrap(); // version
        buf.write_u32::<BigEndian>(1).unwrap(); // agent address type = IPv4
        buf.write_all(&[0u8; 4]).unwrap(); // agent address
        buf.write_all(&[0u8; 12]).unwrap(); // sub_agent+seq+uptime
        buf.write_u32::<BigEndian>(num_samples).unwrap();
        buf.extend_from_slice(&samples);
        buf
    }

    #[test]
    fn flow_sample_scales_by_sampling_rate() {
        let frame = ethernet_ipv4_udp_frame();
        let mut samples = Vec::new();
        push_flow_sample(&mut samples, 100, &frame);
        let datagram = wrap_datagram(samples, 1);

        let records = parse_datagram(&datagram);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.packets, 100);
        assert_eq!(r.bytes, frame.len() as i64 * 100);
        assert_eq!(r.protocol_name, "UDP");
        assert_eq!(r.application.as_deref(), Some("DNS"));
        assert_eq!(r.flow_type, netmon_model::FlowType::Sflow);
    }

    #[test]
    fn zero_sampling_rate_floors_to_one() {
        let frame = ethernet_ipv4_udp_frame();
        let mut samples = Vec::new();
        push_flow_sample(&mut samples, 0, &frame);
        let datagram = wrap_datagram(samples, 1);

        let records = parse_datagram(&datagram);
        assert_eq!(records[0].packets, 1);
        assert_eq!(records[0].bytes, frame.len() as i64);
    }

    #[test]
    fn too_short_datagram_yields_no_records() {
        assert!(parse_datagram(&[0u8; 10]).is_empty());
    }

    #[test]
    fn unsupported_version_yields_no_records() {
        let datagram = wrap_datagram(Vec::new(), 0).iter().copied().collect::<Vec<_>>();
        let mut bad = datagram;
        bad[3] = 9; // version = 9
        assert!(parse_datagram(&bad).is_empty());
    }
}
