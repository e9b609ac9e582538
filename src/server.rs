//! The client-facing gRPC server.

mod prom;

pub use prom::spawn_metrics_server;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};

use crate::config::Config;
use crate::coordinator::{CoordinatorMsg, Session, OUTBOUND_QUEUE_CAPACITY};
use crate::error::RpcResult;
use crate::grpc;
use crate::grpc::Event;

/// Application server.
pub struct AppServer {
    /// The application's runtime config.
    config: Arc<Config>,
    /// The coordinator's message queue.
    events_tx: mpsc::Sender<CoordinatorMsg>,
    /// A channel used for triggering graceful shutdown.
    shutdown: broadcast::Sender<()>,
}

impl AppServer {
    /// Create a new instance.
    pub fn new(config: Arc<Config>, events_tx: mpsc::Sender<CoordinatorMsg>, shutdown: broadcast::Sender<()>) -> Self {
        Self { config, events_tx, shutdown }
    }

    /// Spawn this controller which also creates the client gRPC server.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let addr = format!("0.0.0.0:{}", self.config.client_port)
            .parse()
            .context("failed to parse listener address")?;
        let (shutdown, mut shutdown_rx) = (self.shutdown.clone(), self.shutdown.subscribe());
        let service = grpc::CoordinatorServer::new(self);
        let fut = Server::builder().add_service(service).serve_with_shutdown(addr, async move {
            let _res = shutdown_rx.recv().await;
        });
        tracing::info!(%addr, "client gRPC server is listening");
        Ok(tokio::spawn(async move {
            if let Err(err) = fut.await {
                tracing::error!(error = ?err, "error from client gRPC server");
            }
            let _res = shutdown.send(());
        }))
    }

    /// Register a fresh session with the coordinator, returning its executor
    /// id along with both halves of the outbound queue.
    async fn register_session(&self, peer_info: String) -> RpcResult<(u64, mpsc::Sender<RpcResult<Event>>, mpsc::Receiver<RpcResult<Event>>)> {
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = oneshot::channel();
        self.events_tx
            .send(CoordinatorMsg::StreamConnected {
                peer_info,
                outbound: out_tx.clone(),
                ready: ready_tx,
            })
            .await
            .map_err(|_err| Status::unavailable("coordinator is shutting down"))?;
        let executor_id = ready_rx.await.map_err(|_err| Status::unavailable("coordinator rejected the stream"))?;
        Ok((executor_id, out_tx, out_rx))
    }

    /// Stamp the allocated executor id onto the response metadata.
    fn with_machine_id<T>(stream: T, executor_id: u64) -> RpcResult<Response<T>> {
        let mut response = Response::new(stream);
        let header: MetadataValue<Ascii> = executor_id
            .to_string()
            .parse()
            .map_err(|_err| Status::internal("error encoding machine-id header"))?;
        response.metadata_mut().insert("machine-id", header);
        Ok(response)
    }
}

#[tonic::async_trait]
impl grpc::Coordinator for AppServer {
    /// Server streaming response type for the EventStream method.
    type EventStreamStream = ReceiverStream<RpcResult<Event>>;
    /// Server streaming response type for the EventStreamUniDirect method.
    type EventStreamUniDirectStream = ReceiverStream<RpcResult<Event>>;

    /// Open the primary bidirectional event stream.
    async fn event_stream(&self, request: Request<Streaming<Event>>) -> RpcResult<Response<Self::EventStreamStream>> {
        let peer_info = request.remote_addr().map(|addr| addr.to_string()).unwrap_or_default();
        let inbound = request.into_inner();
        let (executor_id, out_tx, out_rx) = self.register_session(peer_info).await?;
        Session::new(executor_id, self.events_tx.clone(), inbound, out_tx, self.shutdown.subscribe()).spawn();
        Self::with_machine_id(ReceiverStream::new(out_rx), executor_id)
    }

    /// Open a server-to-client-only event stream.
    ///
    /// Observers follow the same startup protocol as full sessions; their
    /// teardown is detected when the outbound queue closes.
    async fn event_stream_uni_direct(&self, request: Request<Event>) -> RpcResult<Response<Self::EventStreamUniDirectStream>> {
        let peer_info = request.remote_addr().map(|addr| addr.to_string()).unwrap_or_default();
        let (executor_id, _out_tx, out_rx) = self.register_session(peer_info).await?;
        Self::with_machine_id(ReceiverStream::new(out_rx), executor_id)
    }

    /// Unary liveness probe outside the event stream.
    async fn ping(&self, request: Request<grpc::PingRequest>) -> RpcResult<Response<grpc::PingResponse>> {
        let req = request.into_inner();
        Ok(Response::new(grpc::PingResponse { tag: req.tag }))
    }

    /// Request coordinator shutdown.
    async fn shutdown(&self, _request: Request<grpc::ShutdownRequest>) -> RpcResult<Response<grpc::ShutdownResponse>> {
        tracing::info!("shutdown requested over RPC");
        let _res = self.shutdown.send(());
        Ok(Response::new(grpc::ShutdownResponse { ok: true }))
    }
}
