///////////////////////////////////////////////////////////////////////////////
// Event Envelope /////////////////////////////////////////////////////////////

/// An empty acknowledgement message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ack {}
/// The envelope carried in both directions on an event stream.
///
/// `message` is a type-tagged payload; the concrete type is dictated by
/// `event`. Requests carry a client-chosen `tag` which the server echoes on
/// the matching `Response` event.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    /// The kind of this event.
    #[prost(enumeration = "EventType", tag = "1")]
    pub event: i32,
    /// An opaque correlation tag, echoed on responses.
    #[prost(string, tag = "2")]
    pub tag: ::prost::alloc::string::String,
    /// The type-tagged payload of this event.
    #[prost(message, optional, tag = "3")]
    pub message: ::core::option::Option<::prost_types::Any>,
    /// Populated on `Response` events when the request failed.
    #[prost(message, optional, tag = "4")]
    pub error: ::core::option::Option<ErrorStatus>,
}
/// A structured error carried on a `Response` event.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorStatus {
    #[prost(enumeration = "ErrorCode", tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}
/// The first server-initiated event on a freshly opened stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamConnected {
    /// The executor id allocated to this stream.
    #[prost(uint64, tag = "1")]
    pub machine_id: u64,
}
///////////////////////////////////////////////////////////////////////////////
// Liveness & Shutdown ////////////////////////////////////////////////////////

/// A request to check coordinator liveness.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PingRequest {
    #[prost(string, tag = "1")]
    pub tag: ::prost::alloc::string::String,
}
/// A response to a liveness check.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PingResponse {
    #[prost(string, tag = "1")]
    pub tag: ::prost::alloc::string::String,
}
/// A request for coordinator shutdown.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownRequest {}
/// A response confirming that shutdown has begun.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownResponse {
    #[prost(bool, tag = "1")]
    pub ok: bool,
}
///////////////////////////////////////////////////////////////////////////////
// Worker Registration ////////////////////////////////////////////////////////

/// A request to register data-plane workers for the calling executor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterWorkersRequest {
    /// The UCX address of each worker to register.
    #[prost(string, repeated, tag = "1")]
    pub ucx_worker_addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// Optional partition addresses, parallel to `ucx_worker_addresses`.
    /// Missing entries default to empty.
    #[prost(string, repeated, tag = "2")]
    pub partition_addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
/// A response carrying the ids of the newly registered workers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterWorkersResponse {
    /// The executor id of the caller.
    #[prost(uint64, tag = "1")]
    pub machine_id: u64,
    /// One id per registered worker, in request order.
    #[prost(uint64, repeated, tag = "2")]
    pub instance_ids: ::prost::alloc::vec::Vec<u64>,
}
/// A request to drop a previously registered worker.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DropWorkerRequest {
    #[prost(uint64, tag = "1")]
    pub instance_id: u64,
}
///////////////////////////////////////////////////////////////////////////////
// Pipeline Registration //////////////////////////////////////////////////////

/// The dataflow graph declared by a client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineConfiguration {
    #[prost(message, repeated, tag = "1")]
    pub segments: ::prost::alloc::vec::Vec<SegmentConfiguration>,
    #[prost(message, repeated, tag = "2")]
    pub manifolds: ::prost::alloc::vec::Vec<ManifoldConfiguration>,
}
/// One segment of a pipeline configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SegmentConfiguration {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Port names this segment consumes from.
    #[prost(string, repeated, tag = "2")]
    pub ingress_ports: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// Port names this segment produces into.
    #[prost(string, repeated, tag = "3")]
    pub egress_ports: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
/// One manifold of a pipeline configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldConfiguration {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}
/// A request to register a pipeline configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineRegisterConfigRequest {
    #[prost(message, optional, tag = "1")]
    pub config: ::core::option::Option<PipelineConfiguration>,
}
/// A response carrying the id of the registered definition.
///
/// The id is a stable hash of the canonical encoded configuration, so
/// re-registering an identical configuration yields the same id.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineRegisterConfigResponse {
    #[prost(uint64, tag = "1")]
    pub pipeline_definition_id: u64,
}
/// The placement of one segment onto workers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SegmentMapping {
    #[prost(string, tag = "1")]
    pub segment_name: ::prost::alloc::string::String,
    /// One segment instance is created per worker id.
    #[prost(uint64, repeated, tag = "2")]
    pub worker_ids: ::prost::alloc::vec::Vec<u64>,
}
/// A client-supplied placement of a pipeline definition onto one executor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineMapping {
    /// The target executor; `0` means the calling executor.
    #[prost(uint64, tag = "1")]
    pub executor_id: u64,
    #[prost(map = "string, message", tag = "2")]
    pub segments: ::std::collections::HashMap<::prost::alloc::string::String, SegmentMapping>,
}
/// A request to attach a mapping to a registered definition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineAddMappingRequest {
    #[prost(uint64, tag = "1")]
    pub definition_id: u64,
    #[prost(message, optional, tag = "2")]
    pub mapping: ::core::option::Option<PipelineMapping>,
}
/// A response carrying the id of the created pipeline instance.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineAddMappingResponse {
    #[prost(uint64, tag = "1")]
    pub pipeline_instance_id: u64,
}
///////////////////////////////////////////////////////////////////////////////
// Resource Updates ///////////////////////////////////////////////////////////

/// A report of the actual segment attachments of a manifold.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldUpdateActualAssignmentsRequest {
    #[prost(uint64, tag = "1")]
    pub manifold_instance_id: u64,
    /// Segment addresses feeding this manifold, keyed to local/remote.
    #[prost(map = "uint64, bool", tag = "2")]
    pub actual_input_segments: ::std::collections::HashMap<u64, bool>,
    /// Segment addresses fed by this manifold, keyed to local/remote.
    #[prost(map = "uint64, bool", tag = "3")]
    pub actual_output_segments: ::std::collections::HashMap<u64, bool>,
}
/// A response to an actual-assignments update.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldUpdateActualAssignmentsResponse {
    #[prost(bool, tag = "1")]
    pub ok: bool,
}
/// A report of a resource's actual lifecycle status.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceUpdateStatusRequest {
    #[prost(uint64, tag = "1")]
    pub resource_id: u64,
    /// One of `Connections | Workers | PipelineInstances | SegmentInstances | ManifoldInstances`.
    #[prost(string, tag = "2")]
    pub resource_type: ::prost::alloc::string::String,
    #[prost(enumeration = "ResourceActualStatus", tag = "3")]
    pub status: i32,
}
/// A response to a status update.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceUpdateStatusResponse {
    #[prost(bool, tag = "1")]
    pub ok: bool,
}
/// A request to stop a resource ahead of its natural completion.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceStopRequest {
    #[prost(uint64, tag = "1")]
    pub resource_id: u64,
    /// Only `SegmentInstances` may be stopped explicitly.
    #[prost(string, tag = "2")]
    pub resource_type: ::prost::alloc::string::String,
}
/// A response to a stop request.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceStopResponse {
    #[prost(bool, tag = "1")]
    pub ok: bool,
}
///////////////////////////////////////////////////////////////////////////////
// State Snapshot /////////////////////////////////////////////////////////////

/// A typed reference to a resource.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceRef {
    #[prost(enumeration = "ResourceKind", tag = "1")]
    pub kind: i32,
    #[prost(uint64, tag = "2")]
    pub id: u64,
}
/// The lifecycle state shared by every live resource.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResourceState {
    #[prost(enumeration = "ResourceRequestedStatus", tag = "1")]
    pub requested_status: i32,
    #[prost(enumeration = "ResourceActualStatus", tag = "2")]
    pub actual_status: i32,
    /// Resources registered against this one to keep it alive.
    #[prost(message, repeated, tag = "3")]
    pub dependees: ::prost::alloc::vec::Vec<ResourceRef>,
    /// Reciprocal mirror of `dependees` on the other side of each edge.
    #[prost(message, repeated, tag = "4")]
    pub dependers: ::prost::alloc::vec::Vec<ResourceRef>,
}
/// An executor (one connected event stream).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Executor {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub peer_info: ::prost::alloc::string::String,
    #[prost(uint64, repeated, tag = "3")]
    pub worker_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "4")]
    pub assigned_pipeline_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "5")]
    pub mapped_pipeline_definition_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(message, optional, tag = "6")]
    pub state: ::core::option::Option<ResourceState>,
}
/// A data-plane worker endpoint.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Worker {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub executor_id: u64,
    #[prost(string, tag = "3")]
    pub ucx_address: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub partition_address: ::prost::alloc::string::String,
    #[prost(uint64, repeated, tag = "5")]
    pub assigned_segment_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(message, optional, tag = "6")]
    pub state: ::core::option::Option<ResourceState>,
}
/// One segment of a registered definition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SegmentDefinition {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub ingress_ports: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "3")]
    pub egress_ports: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
/// One manifold of a registered definition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldDefinition {
    #[prost(string, tag = "1")]
    pub port_name: ::prost::alloc::string::String,
}
/// A registered pipeline definition.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineDefinition {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(message, optional, tag = "2")]
    pub config: ::core::option::Option<PipelineConfiguration>,
    #[prost(map = "string, message", tag = "3")]
    pub segments: ::std::collections::HashMap<::prost::alloc::string::String, SegmentDefinition>,
    #[prost(map = "string, message", tag = "4")]
    pub manifolds: ::std::collections::HashMap<::prost::alloc::string::String, ManifoldDefinition>,
    #[prost(map = "uint64, message", tag = "5")]
    pub mappings: ::std::collections::HashMap<u64, PipelineMapping>,
    #[prost(uint64, repeated, tag = "6")]
    pub instance_ids: ::prost::alloc::vec::Vec<u64>,
}
/// A running incarnation of a definition on one executor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineInstance {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub definition_id: u64,
    #[prost(uint64, tag = "3")]
    pub executor_id: u64,
    #[prost(uint64, repeated, tag = "4")]
    pub segment_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, repeated, tag = "5")]
    pub manifold_ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(message, optional, tag = "6")]
    pub state: ::core::option::Option<ResourceState>,
}
/// A compute node within a pipeline instance.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SegmentInstance {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub name_hash: u32,
    #[prost(uint64, tag = "4")]
    pub segment_address: u64,
    #[prost(uint64, tag = "5")]
    pub executor_id: u64,
    #[prost(uint64, tag = "6")]
    pub worker_id: u64,
    #[prost(uint64, tag = "7")]
    pub pipeline_instance_id: u64,
    #[prost(uint64, tag = "8")]
    pub pipeline_definition_id: u64,
    #[prost(message, optional, tag = "9")]
    pub state: ::core::option::Option<ResourceState>,
}
/// The transport endpoint for one named port.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldInstance {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub port_name: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub pipeline_definition_id: u64,
    #[prost(uint64, tag = "4")]
    pub pipeline_instance_id: u64,
    #[prost(uint64, tag = "5")]
    pub executor_id: u64,
    #[prost(map = "uint64, bool", tag = "6")]
    pub requested_input_segments: ::std::collections::HashMap<u64, bool>,
    #[prost(map = "uint64, bool", tag = "7")]
    pub requested_output_segments: ::std::collections::HashMap<u64, bool>,
    #[prost(map = "uint64, bool", tag = "8")]
    pub actual_input_segments: ::std::collections::HashMap<u64, bool>,
    #[prost(map = "uint64, bool", tag = "9")]
    pub actual_output_segments: ::std::collections::HashMap<u64, bool>,
    #[prost(message, optional, tag = "10")]
    pub state: ::core::option::Option<ResourceState>,
}
/// A keyed collection of executors.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutorsCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, Executor>,
}
/// A keyed collection of workers.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WorkersCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, Worker>,
}
/// A keyed collection of pipeline definitions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineDefinitionsCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, PipelineDefinition>,
}
/// A keyed collection of pipeline instances.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PipelineInstancesCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, PipelineInstance>,
}
/// A keyed collection of segment instances.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SegmentInstancesCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, SegmentInstance>,
}
/// A keyed collection of manifold instances.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ManifoldInstancesCollection {
    #[prost(uint64, repeated, tag = "1")]
    pub ids: ::prost::alloc::vec::Vec<u64>,
    #[prost(map = "uint64, message", tag = "2")]
    pub entities: ::std::collections::HashMap<u64, ManifoldInstance>,
}
/// The full normalized state of the control plane at one nonce.
///
/// Every update is a full snapshot; there are no deltas.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControlPlaneState {
    #[prost(message, optional, tag = "1")]
    pub executors: ::core::option::Option<ExecutorsCollection>,
    #[prost(message, optional, tag = "2")]
    pub workers: ::core::option::Option<WorkersCollection>,
    #[prost(message, optional, tag = "3")]
    pub pipeline_definitions: ::core::option::Option<PipelineDefinitionsCollection>,
    #[prost(message, optional, tag = "4")]
    pub pipeline_instances: ::core::option::Option<PipelineInstancesCollection>,
    #[prost(message, optional, tag = "5")]
    pub segment_instances: ::core::option::Option<SegmentInstancesCollection>,
    #[prost(message, optional, tag = "6")]
    pub manifold_instances: ::core::option::Option<ManifoldInstancesCollection>,
    /// Monotonic version of the coordinator's state.
    #[prost(uint64, tag = "7")]
    pub nonce: u64,
}
/// The payload of a `ServerStateUpdate` broadcast; empty on the direct
/// response to a `ClientEventRequestStateUpdate`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateUpdate {
    #[prost(message, optional, tag = "1")]
    pub state: ::core::option::Option<ControlPlaneState>,
}
///////////////////////////////////////////////////////////////////////////////
// Enumerations ///////////////////////////////////////////////////////////////

/// The kind of an `Event` envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    Unknown = 0,
    /// A server response to a tagged client request.
    Response = 1,
    /// A server-initiated full-state broadcast.
    ServerStateUpdate = 10,
    /// The first server-initiated event on a fresh stream.
    ClientEventStreamConnected = 100,
    ClientEventPing = 101,
    ClientEventRequestStateUpdate = 102,
    ClientUnaryRegisterWorkers = 200,
    ClientUnaryDropWorker = 201,
    ClientUnaryPipelineRegisterConfig = 202,
    ClientUnaryPipelineAddMapping = 203,
    ClientUnaryManifoldUpdateActualAssignments = 204,
    ClientUnaryResourceUpdateStatus = 205,
    ClientUnaryResourceStopRequest = 206,
}
/// Error codes carried on `Response` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    Unknown = 0,
    NotFound = 1,
    InvalidArgument = 2,
    InvalidTransition = 3,
    Internal = 4,
}
/// The requested-status lattice on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResourceRequestedStatus {
    Initialized = 0,
    Created = 1,
    Running = 2,
    Completed = 3,
    Stopped = 4,
    Destroyed = 5,
}
/// The actual-status lattice on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResourceActualStatus {
    Unknown = 0,
    Creating = 1,
    Created = 2,
    Running = 3,
    Completed = 4,
    Stopping = 5,
    Stopped = 6,
    Destroying = 7,
    Destroyed = 8,
}
/// Resource kinds on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResourceKind {
    Unknown = 0,
    Connections = 1,
    Workers = 2,
    PipelineDefinitions = 3,
    PipelineInstances = 4,
    SegmentInstances = 5,
    ManifoldInstances = 6,
}
#[doc = r" Generated server implementations."]
pub mod coordinator_server {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with CoordinatorServer."]
    #[async_trait]
    pub trait Coordinator: Send + Sync + 'static {
        #[doc = "Server streaming response type for the EventStream method."]
        type EventStreamStream: futures_core::Stream<Item = Result<super::Event, tonic::Status>> + Send + Sync + 'static;
        #[doc = " Open the primary bidirectional event stream."]
        async fn event_stream(&self, request: tonic::Request<tonic::Streaming<super::Event>>) -> Result<tonic::Response<Self::EventStreamStream>, tonic::Status>;
        #[doc = "Server streaming response type for the EventStreamUniDirect method."]
        type EventStreamUniDirectStream: futures_core::Stream<Item = Result<super::Event, tonic::Status>> + Send + Sync + 'static;
        #[doc = " Open a server-to-client-only event stream."]
        async fn event_stream_uni_direct(&self, request: tonic::Request<super::Event>) -> Result<tonic::Response<Self::EventStreamUniDirectStream>, tonic::Status>;
        #[doc = " Unary liveness probe outside the event stream."]
        async fn ping(&self, request: tonic::Request<super::PingRequest>) -> Result<tonic::Response<super::PingResponse>, tonic::Status>;
        #[doc = " Request coordinator shutdown."]
        async fn shutdown(&self, request: tonic::Request<super::ShutdownRequest>) -> Result<tonic::Response<super::ShutdownResponse>, tonic::Status>;
    }
    #[doc = " The Weft coordinator interface."]
    #[derive(Debug)]
    pub struct CoordinatorServer<T: Coordinator> {
        inner: _Inner<T>,
        accept_compression_encodings: (),
        send_compression_encodings: (),
    }
    struct _Inner<T>(Arc<T>);
    impl<T: Coordinator> CoordinatorServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner);
            Self {
                inner,
                accept_compression_encodings: Default::default(),
                send_compression_encodings: Default::default(),
            }
        }
        pub fn with_interceptor<F>(inner: T, interceptor: F) -> InterceptedService<Self, F>
        where
            F: tonic::service::Interceptor,
        {
            InterceptedService::new(Self::new(inner), interceptor)
        }
    }
    impl<T, B> tonic::codegen::Service<http::Request<B>> for CoordinatorServer<T>
    where
        T: Coordinator,
        B: Body + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/weft.control.Coordinator/EventStream" => {
                    #[allow(non_camel_case_types)]
                    struct EventStreamSvc<T: Coordinator>(pub Arc<T>);
                    impl<T: Coordinator> tonic::server::StreamingService<super::Event> for EventStreamSvc<T> {
                        type Response = super::Event;
                        type ResponseStream = T::EventStreamStream;
                        type Future = BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<tonic::Streaming<super::Event>>) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).event_stream(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = EventStreamSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(accept_compression_encodings, send_compression_encodings);
                        let res = grpc.streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/weft.control.Coordinator/EventStreamUniDirect" => {
                    #[allow(non_camel_case_types)]
                    struct EventStreamUniDirectSvc<T: Coordinator>(pub Arc<T>);
                    impl<T: Coordinator> tonic::server::ServerStreamingService<super::Event> for EventStreamUniDirectSvc<T> {
                        type Response = super::Event;
                        type ResponseStream = T::EventStreamUniDirectStream;
                        type Future = BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<super::Event>) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).event_stream_uni_direct(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = EventStreamUniDirectSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(accept_compression_encodings, send_compression_encodings);
                        let res = grpc.server_streaming(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/weft.control.Coordinator/Ping" => {
                    #[allow(non_camel_case_types)]
                    struct PingSvc<T: Coordinator>(pub Arc<T>);
                    impl<T: Coordinator> tonic::server::UnaryService<super::PingRequest> for PingSvc<T> {
                        type Response = super::PingResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<super::PingRequest>) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).ping(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = PingSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(accept_compression_encodings, send_compression_encodings);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/weft.control.Coordinator/Shutdown" => {
                    #[allow(non_camel_case_types)]
                    struct ShutdownSvc<T: Coordinator>(pub Arc<T>);
                    impl<T: Coordinator> tonic::server::UnaryService<super::ShutdownRequest> for ShutdownSvc<T> {
                        type Response = super::ShutdownResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(&mut self, request: tonic::Request<super::ShutdownRequest>) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).shutdown(request).await };
                            Box::pin(fut)
                        }
                    }
                    let accept_compression_encodings = self.accept_compression_encodings;
                    let send_compression_encodings = self.send_compression_encodings;
                    let inner = self.inner.clone();
                    let fut = async move {
                        let inner = inner.0;
                        let method = ShutdownSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec).apply_compression_config(accept_compression_encodings, send_compression_encodings);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: Coordinator> Clone for CoordinatorServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self {
                inner,
                accept_compression_encodings: self.accept_compression_encodings,
                send_compression_encodings: self.send_compression_encodings,
            }
        }
    }
    impl<T: Coordinator> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: Coordinator> tonic::transport::NamedService for CoordinatorServer<T> {
        const NAME: &'static str = "weft.control.Coordinator";
    }
}
