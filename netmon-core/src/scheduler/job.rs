//! Job registry (§4.1, §9 design note): replaces APScheduler's implicit
//! job store and `max_instances=1` with an explicit table of
//! `{job_id, schedule, locked}` that [`crate::scheduler::runner`] drives.
//! `locked` marks the four jobs the original gates behind the Redis
//! cross-worker lock (`_acquire_scheduler_lock`); the rest rely on
//! `max_instances=1` alone and run unlocked in every replica.

use std::time::Duration;

/// A job's cadence. `Interval` ticks are wall-clock since the scheduler
/// started; `DailyAt` fires once per UTC calendar day at the given
/// hour:minute, checked at one-minute resolution.
#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    Interval(Duration),
    DailyAt { hour: u32, minute: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct Job {
    pub id: &'static str,
    pub schedule: Schedule,
    /// Whether this job takes the Redis `sched:<id>` lock before running.
    pub locked: bool,
    pub lock_ttl: Duration,
}

/// Builds the fixed job table (§4.1). `snmp_poll`'s interval is the only
/// one sourced from configuration; everything else is a spec-fixed
/// cadence, matching the original's `scheduler.add_job` call sites.
pub fn job_table(snmp_poll_interval: Duration) -> Vec<Job> {
    vec![
        Job { id: "snmp_poll", schedule: Schedule::Interval(snmp_poll_interval), locked: false, lock_ttl: Duration::ZERO },
        Job { id: "alert_eval", schedule: Schedule::Interval(Duration::from_secs(60)), locked: false, lock_ttl: Duration::ZERO },
        Job { id: "metrics_cleanup", schedule: Schedule::Interval(Duration::from_secs(6 * 3600)), locked: false, lock_ttl: Duration::ZERO },
        Job { id: "block_sync", schedule: Schedule::Interval(Duration::from_secs(60)), locked: false, lock_ttl: Duration::ZERO },
        Job { id: "ping_monitor", schedule: Schedule::Interval(Duration::from_secs(60)), locked: true, lock_ttl: Duration::from_secs(55) },
        Job { id: "mlag_discovery", schedule: Schedule::Interval(Duration::from_secs(60)), locked: true, lock_ttl: Duration::from_secs(55) },
        Job { id: "flow_rollup", schedule: Schedule::Interval(Duration::from_secs(300)), locked: true, lock_ttl: Duration::from_secs(270) },
        Job { id: "config_backup", schedule: Schedule::Interval(Duration::from_secs(60)), locked: false, lock_ttl: Duration::ZERO },
        Job { id: "backup_cleanup", schedule: Schedule::DailyAt { hour: 3, minute: 0 }, locked: false, lock_ttl: Duration::ZERO },
        Job { id: "mac_discovery", schedule: Schedule::Interval(Duration::from_secs(300)), locked: true, lock_ttl: Duration::from_secs(270) },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snmp_poll_interval_is_configurable() {
        let table = job_table(Duration::from_secs(30));
        let snmp = table.iter().find(|j| j.id == "snmp_poll").unwrap();
        assert!(matches!(snmp.schedule, Schedule::Interval(d) if d == Duration::from_secs(30)));
    }

    #[test]
    fn only_the_four_original_jobs_are_locked() {
        let table = job_table(Duration::from_secs(60));
        let locked: Vec<_> = table.iter().filter(|j| j.locked).map(|j| j.id).collect();
        assert_eq!(locked, vec!["ping_monitor", "mlag_discovery", "flow_rollup", "mac_discovery"]);
    }
}
