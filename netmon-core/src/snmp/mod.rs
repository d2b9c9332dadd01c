//! SNMP polling: the main interface poller (§4.2), the APC PDU sub-poller
//! (§4.2.1), MAC/VLAN discovery, and MLAG discovery (both §4.2.2).

pub mod client;
pub mod mac_vlan;
pub mod mlag;
pub mod oids;
pub mod pdu_poller;
pub mod poller;

pub use client::{RealSnmpTransport, SnmpTransport};
pub use mac_vlan::discover_mac_table;
pub use mlag::discover_mlag;
pub use pdu_poller::poll_pdu;
pub use poller::poll_device;
