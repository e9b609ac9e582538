use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, SignalStream};
use tokio_stream::StreamMap;

use crate::config::Config;
use crate::coordinator::CoordinatorCtl;
use crate::server::{spawn_metrics_server, AppServer};

/// The application object for when Weft is running as a coordinator.
pub struct App {
    /// The application's runtime config.
    _config: Arc<Config>,

    /// A channel used for triggering graceful shutdown.
    shutdown_tx: broadcast::Sender<()>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,

    /// The join handle of the coordinator task.
    coordinator_handle: JoinHandle<Result<()>>,
    /// The join handle of the client gRPC server.
    client_server: JoinHandle<()>,
    /// The join handle of the metrics server.
    metrics_server: JoinHandle<Result<()>>,
}

impl App {
    /// Create a new instance.
    pub fn new(config: Arc<Config>, shutdown_tx: broadcast::Sender<()>) -> Result<Self> {
        let (coordinator, events_tx) = CoordinatorCtl::new(config.clone(), shutdown_tx.clone());
        let coordinator_handle = coordinator.spawn();

        let client_server = AppServer::new(config.clone(), events_tx, shutdown_tx.clone())
            .spawn()
            .context("error setting up client gRPC server")?;

        let metrics_server = spawn_metrics_server(&config, shutdown_tx.subscribe());

        Ok(Self {
            _config: config,
            shutdown_rx: BroadcastStream::new(shutdown_tx.subscribe()),
            shutdown_tx,
            coordinator_handle,
            client_server,
            metrics_server,
        })
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        let mut signals = StreamMap::new();
        signals.insert("sigterm", SignalStream::new(signal(SignalKind::terminate()).context("error building signal stream")?));
        signals.insert("sigint", SignalStream::new(signal(SignalKind::interrupt()).context("error building signal stream")?));

        loop {
            tokio::select! {
                Some((_, sig)) = signals.next() => {
                    tracing::debug!(signal = ?sig, "signal received, beginning graceful shutdown");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = self.shutdown_rx.next() => break,
            }
        }

        // Begin shutdown routine.
        tracing::debug!("Weft coordinator is shutting down");
        if let Err(err) = self.coordinator_handle.await.context("error joining coordinator handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down coordinator");
        }
        if let Err(err) = self.client_server.await {
            tracing::error!(error = ?err, "error joining client gRPC server task");
        }
        if let Err(err) = self.metrics_server.await.context("error joining metrics server handle").and_then(|res| res) {
            tracing::error!(error = ?err, "error shutting down metrics server");
        }

        tracing::debug!("Weft coordinator shutdown complete");
        Ok(())
    }
}
