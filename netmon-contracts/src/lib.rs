//! Trait surfaces that decouple the alert/query layer from the two
//! concrete flow storage tiers and from the notification transports.

pub mod flow_query_source;
pub mod notify;
pub mod snmp_value;

pub mod prelude {
    pub use super::flow_query_source::{select_flow_source, FlowQuerySource};
    pub use super::notify::{NotificationEnvelope, NotificationSink};
    pub use super::snmp_value::SnmpValue;
}
