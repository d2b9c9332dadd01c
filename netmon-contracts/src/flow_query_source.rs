//! §9 design note: the original duck-typed the `FlowRecord` and
//! `FlowSummary5m` rows so the flow-stats endpoints could query whichever
//! one was cheaper. Here that is a small closed interface instead: each
//! source names its own timestamp/device/bytes columns and count
//! expression, and [`select_flow_source`] is the single place that decides
//! which table backs a given request.

use chrono::Duration;

/// SQL fragment identity for one of the two flow-query-capable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowQuerySource {
    /// Per-flow detail rows; the only source with country/geo data.
    FlowRecord,
    /// Pre-aggregated 5-minute buckets; cheaper for wide spans.
    FlowSummary5m,
}

impl FlowQuerySource {
    pub fn table_name(self) -> &'static str {
        match self {
            FlowQuerySource::FlowRecord => "flow_records",
            FlowQuerySource::FlowSummary5m => "flow_summary_5m",
        }
    }

    pub fn timestamp_column(self) -> &'static str {
        match self {
            FlowQuerySource::FlowRecord => "timestamp",
            FlowQuerySource::FlowSummary5m => "bucket",
        }
    }

    pub fn device_id_column(self) -> &'static str {
        "device_id"
    }

    /// Expression yielding total bytes for a row/group from this source.
    pub fn bytes_expression(self) -> &'static str {
        match self {
            FlowQuerySource::FlowRecord => "bytes",
            FlowQuerySource::FlowSummary5m => "bytes", // already a SUM()
        }
    }

    /// Expression yielding the flow count for a row/group from this source.
    pub fn count_expression(self) -> &'static str {
        match self {
            FlowQuerySource::FlowRecord => "count(*)",
            FlowQuerySource::FlowSummary5m => "flow_count",
        }
    }

    /// This source carries per-flow country codes; `FlowSummary5m` never
    /// does, so geo-breakdown queries must always route to `FlowRecord`
    /// regardless of span (§4.4 "Query routing").
    pub fn has_geo_data(self) -> bool {
        matches!(self, FlowQuerySource::FlowRecord)
    }
}

/// Span at/above which the summary table becomes the cheaper source
/// (§4.4: "when the requested span is ≥6 hours").
pub const SUMMARY_TABLE_THRESHOLD: Duration = Duration::hours(6);

/// Pick the query source for a request spanning `span`, optionally needing
/// geo data (which forces `FlowRecord` regardless of span).
pub fn select_flow_source(span: Duration, needs_geo_data: bool) -> FlowQuerySource {
    if needs_geo_data {
        return FlowQuerySource::FlowRecord;
    }
    if span >= SUMMARY_TABLE_THRESHOLD {
        FlowQuerySource::FlowSummary5m
    } else {
        FlowQuerySource::FlowRecord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_span_uses_flow_record() {
        assert_eq!(
            select_flow_source(Duration::minutes(30), false),
            FlowQuerySource::FlowRecord
        );
    }

    #[test]
    fn long_span_uses_summary() {
        assert_eq!(
            select_flow_source(Duration::hours(6), false),
            FlowQuerySource::FlowSummary5m
        );
        assert_eq!(
            select_flow_source(Duration::hours(24), false),
            FlowQuerySource::FlowSummary5m
        );
    }

    #[test]
    fn geo_data_forces_flow_record_even_for_wide_spans() {
        assert_eq!(
            select_flow_source(Duration::days(30), true),
            FlowQuerySource::FlowRecord
        );
    }
}
