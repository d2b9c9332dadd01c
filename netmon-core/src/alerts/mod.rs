//! Alert evaluation (§4.5, §4.5.1, §4.5.2): the instantaneous device engine
//! and the two windowed aggregate engines share one lifecycle
//! ([`lifecycle`]) and one pair of notification sinks ([`notify`]).

pub mod device_rules;
pub mod lifecycle;
pub mod notify;
pub mod percentile;
pub mod power;
pub mod wan;

use reqwest::Client;

use crate::error::NetmonError;
use crate::store::Store;
use netmon_config::SmtpConfig;

/// Runs all three engines in sequence — this is the body of the
/// `alert_eval` scheduler job (§4.1).
pub async fn evaluate_all(store: &Store, http: &Client, smtp: &SmtpConfig) -> Result<(), NetmonError> {
    device_rules::evaluate_rules(store, http, smtp).await?;
    wan::evaluate_rules(store, http, smtp).await?;
    power::evaluate_rules(store, http, smtp).await?;
    Ok(())
}
