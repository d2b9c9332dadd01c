//! Shared ids, enums, and small value objects used across the netmon
//! workspace: the store, pollers, collector, and alert engines all depend
//! on this crate instead of duplicating these types.

pub mod aggregate;
pub mod enums;
pub mod ids;

pub use enums::*;
pub use ids::*;

use serde::{Deserialize, Serialize};

/// The uniqueness key behind the §3 "at most one active event per
/// (rule, severity, device)" invariant. Carried explicitly so the upsert
/// logic in the alert engines can be written once and shared by all three
/// rule families.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertEventKey {
    pub rule_kind: RuleKind,
    pub rule_id: uuid::Uuid,
    pub device_id: Option<ids::DeviceId>,
    pub severity: Severity,
}
