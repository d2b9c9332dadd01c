//! Fixed-interval job driver (§4.1, §9 design note). One task per
//! registered [`crate::scheduler::job::Job`], each ticking independently
//! and taking the Redis cross-worker lock before jobs the original gated
//! behind `_acquire_scheduler_lock`. Grounded in the `CancellationToken` +
//! `Arc<Self>` supervision idiom this workspace already uses for
//! [`crate::flow::FlowCollector`], itself adapted from `ferrex-core`'s
//! `OrchestratorRuntime`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Timelike, Utc};
use reqwest::Client;
use surge_ping::Client as PingClient;
use tokio_util::sync::CancellationToken;

use crate::alerts;
use crate::flow;
use crate::ping;
use crate::scheduler::job::{self, Job, Schedule};
use crate::snmp::{self, RealSnmpTransport};
use crate::store::ports::{DeviceRepository, FlowRepository, MetricsRepository, PduRepository};
use crate::store::Store;
use netmon_config::{PingConfig, SmtpConfig, SnmpConfig};
use netmon_model::DeviceType;

pub struct SchedulerRunner {
    store: Arc<Store>,
    http: Client,
    smtp: SmtpConfig,
    ping_client: PingClient,
    ping_config: PingConfig,
    snmp_poll_interval: Duration,
    snmp_timeout: Duration,
    ping_timeout: Duration,
    metrics_retention_days: i64,
    shutdown: CancellationToken,
}

impl SchedulerRunner {
    pub fn new(
        store: Arc<Store>,
        http: Client,
        smtp: SmtpConfig,
        snmp: SnmpConfig,
        ping: PingConfig,
        metrics_retention_days: i64,
    ) -> anyhow::Result<Self> {
        let ping_client = ping::build_client()?;
        Ok(Self {
            store,
            http,
            smtp,
            ping_client,
            snmp_poll_interval: Duration::from_secs(snmp.poll_interval_seconds),
            snmp_timeout: Duration::from_secs(snmp.timeout_seconds),
            ping_timeout: Duration::from_millis(ping.timeout_ms),
            ping_config: ping,
            metrics_retention_days,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Spawns one task per job and returns once every task has exited
    /// (i.e. after [`Self::stop`] is called).
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let jobs = job::job_table(self.snmp_poll_interval);
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let runner = self.clone();
            handles.push(tokio::spawn(async move {
                runner.drive(job).await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }

    async fn drive(self: Arc<Self>, job: Job) {
        match job.schedule {
            Schedule::Interval(period) => {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                ticker.tick().await; // first tick fires immediately; skip it and wait a full period
                loop {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            tracing::info!(job = job.id, "scheduler job shutting down");
                            return;
                        }
                        _ = ticker.tick() => {
                            self.run_once(job.id, job.locked, job.lock_ttl).await;
                        }
                    }
                }
            }
            Schedule::DailyAt { hour, minute } => {
                let mut last_run: Option<chrono::NaiveDate> = None;
                let mut ticker = tokio::time::interval(Duration::from_secs(60));
                loop {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            tracing::info!(job = job.id, "scheduler job shutting down");
                            return;
                        }
                        _ = ticker.tick() => {
                            let now = Utc::now();
                            let today = now.date_naive();
                            if now.hour() == hour && now.minute() == minute && last_run != Some(today) {
                                last_run = Some(today);
                                self.run_once(job.id, job.locked, job.lock_ttl).await;
                            }
                        }
                    }
                }
            }
        }
    }

    async fn run_once(&self, id: &'static str, locked: bool, lock_ttl: Duration) {
        if locked {
            let mut cache = self.store.cache.clone();
            if !cache.try_acquire_scheduler_lock(id, lock_ttl).await {
                return;
            }
        }

        if let Err(err) = self.dispatch(id).await {
            tracing::error!(job = id, %err, "scheduler job failed");
        }
    }

    async fn dispatch(&self, id: &'static str) -> anyhow::Result<()> {
        match id {
            "snmp_poll" => self.run_snmp_poll().await,
            "alert_eval" => Ok(alerts::evaluate_all(&self.store, &self.http, &self.smtp).await?),
            "metrics_cleanup" => self.run_metrics_cleanup().await,
            "block_sync" => {
                tracing::debug!("block_sync has no spine eAPI client in this build; skipping");
                Ok(())
            }
            "ping_monitor" => Ok(ping::ping_all_devices(&self.store, &self.ping_client, &self.ping_config, self.ping_timeout).await?),
            "mlag_discovery" => self.run_mlag_discovery().await,
            "flow_rollup" => flow::rollup_flows(&self.store).await,
            "config_backup" => {
                tracing::debug!("config_backup has no device config-fetch client in this build; skipping");
                Ok(())
            }
            "backup_cleanup" => {
                tracing::debug!("backup_cleanup has no device config-fetch client in this build; skipping");
                Ok(())
            }
            "mac_discovery" => self.run_mac_discovery().await,
            other => {
                tracing::warn!(job = other, "unknown scheduler job id");
                Ok(())
            }
        }
    }

    /// Regular devices (excludes PDUs, which have their own sub-poller)
    /// then the PDU fleet, mirroring the original's two-pass split.
    async fn run_snmp_poll(&self) -> anyhow::Result<()> {
        let transport = RealSnmpTransport;

        for device in self.store.devices.list_active().await? {
            if device.device_type.is_pdu() {
                continue;
            }
            if let Err(err) = snmp::poll_device(&self.store, &transport, &device, self.snmp_timeout).await {
                tracing::warn!(device = %device.hostname, %err, "error polling device");
            }
        }

        for device in self.store.devices.list_active_by_type(DeviceType::Pdu).await? {
            if let Err(err) = snmp::poll_pdu(&self.store, &transport, &device, self.snmp_timeout).await {
                tracing::warn!(device = %device.hostname, %err, "error polling PDU");
            }
        }

        Ok(())
    }

    async fn run_mac_discovery(&self) -> anyhow::Result<()> {
        let transport = RealSnmpTransport;

        for device in self.store.devices.list_active().await? {
            if !device.device_type.is_switch() {
                continue;
            }
            match snmp::discover_mac_table(&self.store, &transport, &device, self.snmp_timeout).await {
                Ok(count) if count > 0 => tracing::debug!(device = %device.hostname, count, "MAC discovery"),
                Ok(_) => {}
                Err(err) => tracing::warn!(device = %device.hostname, %err, "MAC discovery failed"),
            }
        }

        Ok(())
    }

    async fn run_mlag_discovery(&self) -> anyhow::Result<()> {
        let transport = RealSnmpTransport;

        for device in self.store.devices.list_active().await? {
            if !device.device_type.is_switch() {
                continue;
            }
            if let Err(err) = snmp::discover_mlag(&self.store, &transport, &self.http, &device, self.snmp_timeout).await {
                tracing::warn!(device = %device.hostname, %err, "MLAG discovery failed");
            }
        }

        Ok(())
    }

    /// Prunes `interface_metrics`, `flow_records`, and `pdu_metrics` rows
    /// older than the configured retention window (§2 supplemented
    /// feature; no separate `device_metric_history` table exists in this
    /// model — CPU/memory are latest-value fields on `Device`).
    async fn run_metrics_cleanup(&self) -> anyhow::Result<()> {
        let cutoff = Utc::now() - ChronoDuration::days(self.metrics_retention_days);

        let interface_metrics = self.store.metrics.delete_older_than(cutoff).await?;
        let flow_records = self.store.flows.delete_records_older_than(cutoff).await?;
        let pdu_metrics = self.store.pdu.delete_metrics_older_than(cutoff).await?;

        tracing::info!(interface_metrics, flow_records, pdu_metrics, "metrics cleanup complete");
        Ok(())
    }
}
