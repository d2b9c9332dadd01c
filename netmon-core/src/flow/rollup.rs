//! Flow rollup job (§4.4): aggregates flow_records into flow_summary_5m on
//! a fixed schedule, plus the one-time backfill run on first boot.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::info;

use crate::store::Store;
use crate::system_event::SystemEventLogger;

const BUCKET_SECONDS: i64 = 300;
const OVERLAP_MINUTES: i64 = 15;
const BACKFILL_MARKER: &str = "flow_rollup_backfilled";

/// Floors `ts` to the start of its 5-minute bucket.
fn floor_to_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    let epoch = ts.timestamp();
    let floored = (epoch / BUCKET_SECONDS) * BUCKET_SECONDS;
    Utc.timestamp_opt(floored, 0).single().unwrap_or(ts)
}

/// Aggregates the trailing 15-minute overlap window, excluding the
/// current in-progress bucket so partial rows are never upserted.
pub async fn rollup_flows(store: &Store) -> anyhow::Result<()> {
    let now = Utc::now();
    let window_end = floor_to_bucket(now);
    let window_start = window_end - Duration::minutes(OVERLAP_MINUTES);

    upsert_window(store, window_start, window_end).await
}

async fn upsert_window(store: &Store, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> anyhow::Result<()> {
    let summaries = store.flows.aggregate_for_rollup(window_start, window_end).await?;
    for summary in &summaries {
        store.flows.upsert_summary(summary).await?;
    }
    Ok(())
}

/// Runs once on first boot: walks backward in 1-hour chunks over the
/// trailing `days` days, applying the same aggregation+upsert, then
/// marks [`BACKFILL_MARKER`] so this never runs again.
pub async fn backfill_if_needed(store: &Store, days: i64) -> anyhow::Result<()> {
    if store.settings.get(BACKFILL_MARKER).await?.is_some() {
        return Ok(());
    }

    let logger = SystemEventLogger::new(&store.system_events, "flow_rollup");
    let now = Utc::now();
    let mut chunk_end = floor_to_bucket(now);
    let horizon = now - Duration::days(days);

    while chunk_end > horizon {
        let chunk_start = chunk_end - Duration::hours(1);
        if let Err(err) = backfill_chunk(store, chunk_start, chunk_end).await {
            let _ = logger
                .error("flow_rollup_backfill_failed", "time_range", &chunk_start.to_rfc3339(), err.to_string())
                .await;
            return Err(err);
        }
        chunk_end = chunk_start;
    }

    store.settings.set(BACKFILL_MARKER, "true", false, None).await?;
    info!(days, "flow rollup backfill complete");
    Ok(())
}

async fn backfill_chunk(store: &Store, chunk_start: DateTime<Utc>, chunk_end: DateTime<Utc>) -> anyhow::Result<()> {
    upsert_window(store, chunk_start, chunk_end).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn floors_to_five_minute_boundary() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 12, 7, 42).unwrap();
        let floored = floor_to_bucket(ts);
        assert_eq!(floored, Utc.with_ymd_and_hms(2026, 1, 1, 12, 5, 0).unwrap());
    }

    #[test]
    fn exact_boundary_is_idempotent() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 12, 5, 0).unwrap();
        assert_eq!(floor_to_bucket(ts), ts);
    }
}
