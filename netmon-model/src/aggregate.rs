//! Metric names recognized by the WAN and Power aggregate alert engines
//! (§4.5.1, §4.5.2). Kept as closed enums rather than free-form strings so
//! an invalid `metric` on a `WanAlertRule`/`PowerAlertRule` row is rejected
//! at the config-validation boundary instead of failing silently at
//! evaluation time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WanMetric {
    P95In,
    P95Out,
    P95Max,
    MaxIn,
    MaxOut,
    AvgIn,
    AvgOut,
    CommitmentPct,
}

impl FromStr for WanMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "p95_in" => WanMetric::P95In,
            "p95_out" => WanMetric::P95Out,
            "p95_max" => WanMetric::P95Max,
            "max_in" => WanMetric::MaxIn,
            "max_out" => WanMetric::MaxOut,
            "avg_in" => WanMetric::AvgIn,
            "avg_out" => WanMetric::AvgOut,
            "commitment_pct" => WanMetric::CommitmentPct,
            other => return Err(format!("unknown WAN aggregate metric: {other}")),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMetric {
    TotalPower,
    AvgLoad,
    MaxLoad,
    MaxTemp,
    AvgTemp,
    BudgetPct,
}

impl FromStr for PowerMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "total_power" => PowerMetric::TotalPower,
            "avg_load" => PowerMetric::AvgLoad,
            "max_load" => PowerMetric::MaxLoad,
            "max_temp" => PowerMetric::MaxTemp,
            "avg_temp" => PowerMetric::AvgTemp,
            "budget_pct" => PowerMetric::BudgetPct,
            other => return Err(format!("unknown power aggregate metric: {other}")),
        })
    }
}
