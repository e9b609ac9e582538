//! The coordinator control task.
//!
//! A single actor owns the resource store, which makes the store single-writer
//! by construction: every session forwards its events here over one channel,
//! and all mutation happens inline in this task. Sessions own nothing but
//! their outbound queue.
//!
//! Ordering contract per request: the request barrier opens, the handler
//! mutates the store (watchers drain inside each dispatch), the barrier
//! closes, the new snapshot is pushed onto every session's outbound queue,
//! and only then is the buffered response released to the requesting session.

mod handlers;
pub mod session;


pub use session::Session;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::stream::StreamExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, ReceiverStream};

use crate::config::Config;
use crate::error::{RpcResult, ShutdownError};
use crate::grpc::Event;
use crate::store::{snapshot, Action, Store};
use crate::watchers;

const METRIC_EVENTS: &str = "weft_coordinator_events";
const METRIC_HANDLER_ERRORS: &str = "weft_coordinator_handler_errors";
const METRIC_SNAPSHOT_BROADCASTS: &str = "weft_coordinator_snapshot_broadcasts";
const METRIC_CONNECTED_EXECUTORS: &str = "weft_coordinator_connected_executors";

/// The outbound queue capacity per session. A session that falls this far
/// behind the broadcast stream is torn down as a slow consumer.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// The outcome of one request, handed back to the session task.
#[derive(Debug)]
pub struct RequestOutcome {
    /// Buffered response events, released after the snapshot broadcast.
    pub responses: Vec<Event>,
    /// The session must tear itself down (listener failure or reaped).
    pub fatal: bool,
}

/// A message bound for the coordinator task.
pub enum CoordinatorMsg {
    /// A new event stream opened.
    StreamConnected {
        peer_info: String,
        outbound: mpsc::Sender<RpcResult<Event>>,
        ready: oneshot::Sender<u64>,
    },
    /// An event stream closed, errored, or was aborted.
    StreamDisconnected { executor_id: u64 },
    /// A request event from a connected session.
    Request {
        executor_id: u64,
        event: Event,
        tx: oneshot::Sender<RequestOutcome>,
    },
}

/// A connected session's server-side handle.
struct SessionHandle {
    outbound: mpsc::Sender<RpcResult<Event>>,
}

/// The coordinator actor.
pub struct CoordinatorCtl {
    /// The application's runtime config.
    _config: Arc<Config>,
    /// The authoritative resource store.
    store: Store,
    /// All connected sessions by executor id.
    sessions: HashMap<u64, SessionHandle>,

    /// A channel of inbound coordinator messages.
    events_rx: ReceiverStream<CoordinatorMsg>,
    /// A channel used for triggering graceful shutdown.
    shutdown_rx: BroadcastStream<()>,
}

impl CoordinatorCtl {
    /// Create a new instance.
    pub fn new(config: Arc<Config>, shutdown_tx: broadcast::Sender<()>) -> (Self, mpsc::Sender<CoordinatorMsg>) {
        metrics::register_counter!(METRIC_EVENTS, metrics::Unit::Count, "events received on the coordinator task");
        metrics::register_counter!(METRIC_HANDLER_ERRORS, metrics::Unit::Count, "request handler errors");
        metrics::register_counter!(METRIC_SNAPSHOT_BROADCASTS, metrics::Unit::Count, "state snapshot broadcasts");
        metrics::register_gauge!(METRIC_CONNECTED_EXECUTORS, metrics::Unit::Count, "currently connected executors");
        let (events_tx, events_rx) = mpsc::channel(1000);
        (
            Self {
                _config: config,
                store: Store::new(watchers::all()),
                sessions: Default::default(),
                events_rx: ReceiverStream::new(events_rx),
                shutdown_rx: BroadcastStream::new(shutdown_tx.subscribe()),
            },
            events_tx,
        )
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> Result<()> {
        tracing::debug!("coordinator task has started");
        loop {
            tokio::select! {
                msg_opt = self.events_rx.next() => match msg_opt {
                    Some(msg) => self.handle_msg(msg).await,
                    None => {
                        self.sessions.clear();
                        return Err(ShutdownError(anyhow::anyhow!("coordinator events channel closed unexpectedly")).into());
                    }
                },
                _ = self.shutdown_rx.next() => break,
            }
        }
        // Dropping the session handles closes every outbound queue, which
        // terminates the per-stream response generators.
        self.sessions.clear();
        tracing::debug!("coordinator task has shutdown");
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self, msg))]
    async fn handle_msg(&mut self, msg: CoordinatorMsg) {
        match msg {
            CoordinatorMsg::StreamConnected { peer_info, outbound, ready } => self.handle_stream_connected(peer_info, outbound, ready).await,
            CoordinatorMsg::StreamDisconnected { executor_id } => self.handle_stream_disconnected(executor_id),
            CoordinatorMsg::Request { executor_id, event, tx } => self.handle_request(executor_id, event, tx),
        }
    }

    /// Run the startup protocol for a fresh stream: allocate an executor id,
    /// record the connection, emit the handshake event, then fan out the
    /// snapshot that includes the new executor.
    #[tracing::instrument(level = "debug", skip(self, peer_info, outbound, ready))]
    async fn handle_stream_connected(&mut self, peer_info: String, outbound: mpsc::Sender<RpcResult<Event>>, ready: oneshot::Sender<u64>) {
        let executor_id = self.store.allocate_id();
        let barrier = format!("connect/{}", executor_id);
        let res = self
            .store
            .dispatch(Action::StartRequest { id: barrier.clone() })
            .and_then(|_| {
                self.store.dispatch(Action::ConnectionsAdd {
                    id: executor_id,
                    peer_info: peer_info.clone(),
                })
            })
            .and_then(|_| self.store.dispatch(Action::StopRequest { id: barrier }));
        if let Err(err) = res {
            tracing::error!(error = %err, executor_id, "error recording new connection");
            return;
        }

        let connected = match Event::stream_connected(executor_id) {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(error = %err, "error building stream connected event");
                return;
            }
        };
        if outbound.try_send(Ok(connected)).is_err() {
            tracing::debug!(executor_id, "new session hung up before the handshake");
            self.remove_executor(executor_id);
            return;
        }
        self.sessions.insert(executor_id, SessionHandle { outbound });
        metrics::gauge!(METRIC_CONNECTED_EXECUTORS, self.sessions.len() as f64);
        tracing::info!(executor_id, peer_info = %peer_info, "executor connected");

        self.broadcast_snapshot();
        let _ = ready.send(executor_id);
    }

    /// Run the teardown protocol for a closed stream.
    #[tracing::instrument(level = "debug", skip(self))]
    fn handle_stream_disconnected(&mut self, executor_id: u64) {
        if self.sessions.remove(&executor_id).is_none() {
            return;
        }
        metrics::gauge!(METRIC_CONNECTED_EXECUTORS, self.sessions.len() as f64);
        tracing::info!(executor_id, "executor disconnected");
        self.remove_executor(executor_id);
        self.broadcast_snapshot();
    }

    /// Cascade-remove an executor and everything it owns.
    fn remove_executor(&mut self, executor_id: u64) {
        let barrier = format!("disconnect/{}", executor_id);
        let res = self
            .store
            .dispatch(Action::StartRequest { id: barrier.clone() })
            .and_then(|_| self.store.dispatch(Action::ConnectionsDropOne { id: executor_id }))
            .and_then(|_| self.store.dispatch(Action::StopRequest { id: barrier }));
        if let Err(err) = res {
            tracing::error!(error = %err, executor_id, "error cascading executor removal");
        }
    }

    /// Handle one request event inside a request barrier span.
    #[tracing::instrument(level = "debug", skip(self, event, tx))]
    fn handle_request(&mut self, executor_id: u64, event: Event, tx: oneshot::Sender<RequestOutcome>) {
        metrics::increment_counter!(METRIC_EVENTS);
        if !self.sessions.contains_key(&executor_id) {
            let _ = tx.send(RequestOutcome {
                responses: Vec::new(),
                fatal: true,
            });
            return;
        }

        let tag = event.tag.clone();
        let barrier = format!("{}/{}", executor_id, if tag.is_empty() { "-" } else { tag.as_str() });
        let nonce_before = self.store.nonce();
        let mut fatal = false;

        if let Err(err) = self.store.dispatch(Action::StartRequest { id: barrier.clone() }) {
            tracing::error!(error = %err, "error opening request barrier");
            fatal = true;
        }
        let result = handlers::handle_event(&mut self.store, executor_id, &event);
        if let Err(err) = self.store.dispatch(Action::StopRequest { id: barrier }) {
            tracing::error!(error = %err, "error closing request barrier");
            fatal = true;
        }

        let responses = match result {
            Ok(responses) => responses,
            Err(err) => {
                metrics::increment_counter!(METRIC_HANDLER_ERRORS);
                if err.is_fatal() {
                    // The store may be in a surprising (though internally
                    // consistent) state; poison this stream.
                    fatal = true;
                }
                let err = err.into_app_error();
                tracing::warn!(error = %err, executor_id, tag = %tag, "request handler error");
                vec![Event::error_response(tag, err.into_error_status())]
            }
        };

        // Broadcast before releasing the response so no client observes a
        // response ahead of the snapshot that carries its effects.
        if self.store.nonce() != nonce_before {
            self.broadcast_snapshot();
        }
        if !self.sessions.contains_key(&executor_id) {
            fatal = true;
        }
        let _ = tx.send(RequestOutcome { responses, fatal });
    }

    /// Serialize the current state once and push it to every session,
    /// reaping sessions whose queues are closed or saturated.
    fn broadcast_snapshot(&mut self) {
        loop {
            let payload = match snapshot::state_update_payload(self.store.state()) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(error = %err, "error serializing state snapshot");
                    return;
                }
            };
            metrics::increment_counter!(METRIC_SNAPSHOT_BROADCASTS);
            let mut dead = Vec::new();
            for (id, session) in &self.sessions {
                if session.outbound.try_send(Ok(Event::state_update(payload.clone()))).is_err() {
                    dead.push(*id);
                }
            }
            if dead.is_empty() {
                return;
            }
            // Dropped sessions mutate the state, so go around again and
            // broadcast the post-drop snapshot.
            for id in dead {
                tracing::warn!(executor_id = id, "session outbound queue closed or saturated, dropping session");
                if self.sessions.remove(&id).is_some() {
                    self.remove_executor(id);
                }
            }
            metrics::gauge!(METRIC_CONNECTED_EXECUTORS, self.sessions.len() as f64);
        }
    }
}
