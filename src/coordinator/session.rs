//! Per-stream session tasks.
//!
//! One task per bidirectional event stream. The task reads inbound events and
//! forwards them to the coordinator one at a time: the next inbound event is
//! not read until the previous request's outcome has landed, which is what
//! strictly serializes request handling per stream. Responses are pushed onto
//! the same outbound queue the coordinator broadcasts snapshots into, after
//! the snapshot that carries their effects.

use futures::stream::StreamExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tonic::Streaming;

use crate::coordinator::{CoordinatorMsg, RequestOutcome};
use crate::error::RpcResult;
use crate::grpc::Event;

/// The server side of one bidirectional event stream.
pub struct Session {
    /// The executor id allocated to this stream.
    executor_id: u64,
    /// The coordinator's message queue.
    events_tx: mpsc::Sender<CoordinatorMsg>,
    /// The inbound half of the stream.
    inbound: Streaming<Event>,
    /// The outbound queue, shared with the coordinator's broadcast fan-out.
    outbound: mpsc::Sender<RpcResult<Event>>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,
}

impl Session {
    /// Create a new instance.
    pub fn new(
        executor_id: u64, events_tx: mpsc::Sender<CoordinatorMsg>, inbound: Streaming<Event>, outbound: mpsc::Sender<RpcResult<Event>>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            executor_id,
            events_tx,
            inbound,
            outbound,
            shutdown_rx: BroadcastStream::new(shutdown_rx),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::debug!(executor_id = self.executor_id, "session task has started");
        loop {
            tokio::select! {
                msg_opt = self.inbound.next() => match msg_opt {
                    Some(Ok(event)) => {
                        if !self.handle_event(event).await {
                            break;
                        }
                    }
                    Some(Err(status)) => {
                        tracing::debug!(executor_id = self.executor_id, error = %status, "event stream transport error");
                        break;
                    }
                    None => break,
                },
                _ = self.shutdown_rx.next() => break,
            }
        }
        // Teardown: the coordinator unsubscribes the outbound queue and
        // cascades away everything this executor owned.
        let _ = self
            .events_tx
            .send(CoordinatorMsg::StreamDisconnected {
                executor_id: self.executor_id,
            })
            .await;
        tracing::debug!(executor_id = self.executor_id, "session task has shutdown");
    }

    /// Forward one request and await its outcome before reading the next.
    ///
    /// Returns `false` when the session must shut down.
    async fn handle_event(&mut self, event: Event) -> bool {
        let (tx, rx) = oneshot::channel();
        let sent = self
            .events_tx
            .send(CoordinatorMsg::Request {
                executor_id: self.executor_id,
                event,
                tx,
            })
            .await;
        if sent.is_err() {
            return false;
        }
        let outcome: RequestOutcome = match rx.await {
            Ok(outcome) => outcome,
            Err(_) => return false,
        };
        for response in outcome.responses {
            if self.outbound.send(Ok(response)).await.is_err() {
                return false;
            }
        }
        !outcome.fatal
    }
}
