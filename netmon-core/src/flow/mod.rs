//! Flow collection, parsing, and rollup (§4.3, §4.4).

pub mod collector;
pub mod enrich;
pub mod netflow;
pub mod rollup;
pub mod sflow;

pub use collector::FlowCollector;
pub use rollup::{backfill_if_needed, rollup_flows};
