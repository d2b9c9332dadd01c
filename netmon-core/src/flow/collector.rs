//! NetFlow/sFlow UDP listeners (§4.3). Two independent sockets, each
//! driven by its own task so a slow parse on one protocol never backs up
//! reads on the other; each datagram is handed to its own short-lived
//! task so parsing never blocks the socket read loop. Every spawned
//! per-datagram task is tracked so `stop()` can cancel and await them
//! rather than leaving them to run past shutdown.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::flow::{netflow, sflow};
use crate::store::Store;
use netmon_config::FlowConfig;

/// Longest UDP datagram we'll attempt to parse; anything larger is
/// almost certainly not one of our two protocols.
const MAX_DATAGRAM_BYTES: usize = 65_507;

/// How long [`FlowCollector::run`] waits for in-flight `handle_datagram`
/// tasks to finish once the listener loops have already returned.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FlowCollector {
    store: Arc<Store>,
    config: FlowConfig,
    shutdown: CancellationToken,
    // Tracks every spawned `handle_datagram` task so `run()` can cancel
    // and await them on shutdown instead of leaving them to fire-and-forget
    // (§4.3: "outstanding tasks are cancelled and awaited"). Mirrors
    // `ferrex-core`'s `OrchestratorRuntime::worker_handles`.
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl FlowCollector {
    pub fn new(store: Arc<Store>, config: FlowConfig) -> Self {
        Self {
            store,
            config,
            shutdown: CancellationToken::new(),
            task_handles: Mutex::new(Vec::new()),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Binds both listeners and runs until cancelled. Returns once both
    /// listener tasks have exited.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let netflow_socket = UdpSocket::bind(("0.0.0.0", self.config.netflow_port)).await?;
        let sflow_socket = UdpSocket::bind(("0.0.0.0", self.config.sflow_port)).await?;
        info!(
            netflow_port = self.config.netflow_port,
            sflow_port = self.config.sflow_port,
            "flow collector listening"
        );

        let netflow_collector = self.clone();
        let netflow_task = tokio::spawn(async move {
            netflow_collector.listen_loop(netflow_socket, FlowKind::Netflow).await;
        });

        let sflow_collector = self.clone();
        let sflow_task = tokio::spawn(async move {
            sflow_collector.listen_loop(sflow_socket, FlowKind::Sflow).await;
        });

        let _ = tokio::join!(netflow_task, sflow_task);
        self.drain_datagram_tasks().await;
        Ok(())
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Cancels and awaits every still-outstanding `handle_datagram` task
    /// (§4.3: "outstanding tasks are cancelled and awaited"), bounded by
    /// [`DRAIN_TIMEOUT`] so a stuck task can't hang shutdown forever.
    async fn drain_datagram_tasks(&self) {
        let handles = std::mem::take(&mut *self.task_handles.lock().await);
        if handles.is_empty() {
            return;
        }

        debug!(count = handles.len(), "draining in-flight flow handler tasks");
        for handle in &handles {
            if !handle.is_finished() {
                handle.abort();
            }
        }

        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("timed out draining flow handler tasks");
        }
    }

    async fn listen_loop(self: Arc<Self>, socket: UdpSocket, kind: FlowKind) {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        loop {
            let (len, exporter) = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(?kind, "flow listener shutting down");
                    return;
                }
                result = socket.recv_from(&mut buf) => match result {
                    Ok(pair) => pair,
                    Err(err) => {
                        error!(?kind, error = %err, "flow socket recv error");
                        continue;
                    }
                },
            };

            let datagram = buf[..len].to_vec();
            let exporter_ip = exporter.ip();
            let collector = self.clone();
            let handle = tokio::spawn(async move {
                collector.handle_datagram(kind, exporter_ip, datagram).await;
            });
            self.track_datagram_task(handle).await;
        }
    }

    /// Records a just-spawned `handle_datagram` task so shutdown can find
    /// it, pruning already-finished entries first so the registry doesn't
    /// grow unbounded across a long-running listener.
    async fn track_datagram_task(&self, handle: JoinHandle<()>) {
        let mut handles = self.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    async fn handle_datagram(&self, kind: FlowKind, exporter_ip: IpAddr, datagram: Vec<u8>) {
        let mut records = match kind {
            FlowKind::Netflow => match netflow::parse_datagram(&datagram) {
                Ok(records) => records,
                Err(err) => {
                    debug!(exporter = %exporter_ip, error = %err, "dropping malformed NetFlow datagram");
                    return;
                }
            },
            FlowKind::Sflow => sflow::parse_datagram(&datagram),
        };

        if records.is_empty() {
            return;
        }

        let device_id = match self.store.devices.find_by_ip(exporter_ip).await {
            Ok(device) => device.map(|d| d.id),
            Err(err) => {
                warn!(exporter = %exporter_ip, error = %err, "device lookup failed for flow exporter");
                None
            }
        };
        for record in &mut records {
            record.device_id = device_id;
        }

        if let Err(err) = self.store.flows.insert_batch(&records).await {
            error!(exporter = %exporter_ip, error = %err, "failed to store flow records");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FlowKind {
    Netflow,
    Sflow,
}
