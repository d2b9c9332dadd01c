//! Telemetry-ingest-and-alert engine core: SNMP polling, flow collection
//! and rollup, ICMP probing, the three alert engines, and the scheduler
//! that drives them all on their configured cadence (§4).

pub mod alerts;
pub mod error;
pub mod flow;
pub mod ping;
pub mod scheduler;
pub mod secrets;
pub mod snmp;
pub mod store;
pub mod system_event;

pub use error::{NetmonError, Result};
