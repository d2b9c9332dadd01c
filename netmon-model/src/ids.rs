//! Strongly typed identifiers for store entities.
//!
//! Every id wraps a [`Uuid`] so that, for example, a `DeviceId` can never be
//! passed where an `InterfaceId` is expected even though both are UUIDs on
//! the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_id!(DeviceId);
typed_id!(InterfaceId);
typed_id!(AlertRuleId);
typed_id!(WanAlertRuleId);
typed_id!(PowerAlertRuleId);
typed_id!(AlertEventId);
typed_id!(FlowRecordId);
