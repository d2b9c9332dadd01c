//! §9 design note: "parse once into a typed value container ... and
//! dispatch by variant" replaces the original's reliance on pysnmp's
//! runtime-typed return values.

use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Timeticks(u64),
    Counter32(u32),
    Counter64(u64),
    Gauge32(u32),
    Integer(i64),
    OctetString(Vec<u8>),
    IpAddress(Ipv4Addr),
    Oid(String),
    Null,
}

impl SnmpValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            SnmpValue::Timeticks(v) => Some(*v),
            SnmpValue::Counter64(v) => Some(*v),
            SnmpValue::Counter32(v) => Some(*v as u64),
            SnmpValue::Gauge32(v) => Some(*v as u64),
            SnmpValue::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SnmpValue::Integer(v) => Some(*v),
            other => other.as_u64().map(|v| v as i64),
        }
    }

    pub fn as_str(&self) -> Option<String> {
        match self {
            SnmpValue::OctetString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            SnmpValue::Oid(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// True for variants that a 64-bit HC counter table can populate;
    /// distinguishing this from `Counter32` drives the HC/32-bit fallback
    /// in §4.2 step 2.
    pub fn is_high_capacity(&self) -> bool {
        matches!(self, SnmpValue::Counter64(_))
    }
}
