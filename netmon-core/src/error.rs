//! Error taxonomy (§7). Transient device errors and datagram-parse errors
//! are modeled as distinct types from store errors so callers can decide,
//! per §7's propagation policy, whether a failure should abort a job or
//! just get logged to [`crate::system_event`] and skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("row not found: {0}")]
    NotFound(String),
    #[error("invalid rule configuration: {0}")]
    InvalidRule(String),
}

/// §9 design note: distinguishes "not present" from "timeout" from
/// "malformed" instead of collapsing all three into `None` the way the
/// original's SNMP helpers did.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("SNMP timeout contacting {0}")]
    Timeout(String),
    #[error("OID not present on device")]
    NotPresent,
    #[error("malformed SNMP response: {0}")]
    Malformed(String),
    #[error("device transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("truncated datagram ({len} bytes)")]
    Truncated { len: usize },
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u16),
    #[error("malformed datagram: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum NetmonError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Collector(#[from] CollectorError),
}

pub type Result<T> = std::result::Result<T, NetmonError>;
