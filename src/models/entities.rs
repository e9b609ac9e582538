//! Entity records held by the resource store.
//!
//! All cross-entity references are by id (see `ResourceRef`); the store
//! resolves them at read time and enforces that they never dangle.

use std::collections::BTreeMap;

use crate::models::ResourceState;

/// A worker process connected by one event stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Executor {
    pub id: u64,
    /// Transport-level peer info (remote address) captured at stream open.
    pub peer_info: String,
    pub worker_ids: Vec<u64>,
    pub assigned_pipeline_ids: Vec<u64>,
    pub mapped_pipeline_definition_ids: Vec<u64>,
    pub state: ResourceState,
}

/// A data-plane endpoint within an executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worker {
    pub id: u64,
    pub executor_id: u64,
    /// The UCX address used for worker-to-worker transfers.
    pub ucx_address: String,
    /// The address used for partition-level exchanges, when published.
    pub partition_address: String,
    pub assigned_segment_ids: Vec<u64>,
    pub state: ResourceState,
}

/// A segment declared by a pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentDef {
    pub name: String,
    /// Port names this segment consumes from; each needs a manifold.
    pub ingress_ports: Vec<String>,
    /// Port names this segment produces into; each needs a manifold.
    pub egress_ports: Vec<String>,
}

/// A manifold (named port) declared by a pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifoldDef {
    pub port_name: String,
}

/// The placement of one segment onto workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentMapping {
    pub segment_name: String,
    pub worker_ids: Vec<u64>,
}

/// A client-supplied placement of a pipeline definition onto one executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMapping {
    pub executor_id: u64,
    pub segments: BTreeMap<String, SegmentMapping>,
}

/// A named, immutable dataflow graph plus its per-executor mappings.
///
/// Definitions carry no `ResourceState`: they have no lifecycle and are never
/// the target of status updates. Mappings may be added after registration;
/// everything else is frozen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineDefinition {
    pub id: u64,
    /// The canonical encoded configuration this definition was built from.
    pub config: crate::grpc::PipelineConfiguration,
    pub segments: BTreeMap<String, SegmentDef>,
    pub manifolds: BTreeMap<String, ManifoldDef>,
    pub mappings: BTreeMap<u64, PipelineMapping>,
    pub instance_ids: Vec<u64>,
}

/// A running incarnation of a pipeline definition on one executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineInstance {
    pub id: u64,
    pub definition_id: u64,
    pub executor_id: u64,
    pub segment_ids: Vec<u64>,
    pub manifold_ids: Vec<u64>,
    pub state: ResourceState,
}

/// A compute node within a pipeline instance, pinned to one worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentInstance {
    pub id: u64,
    pub name: String,
    /// Stable 32-bit hash of `name`, the upper half of `segment_address`.
    pub name_hash: u32,
    /// Combined address: `(name_hash << 32) | (id & 0xffff_ffff)`.
    pub segment_address: u64,
    pub executor_id: u64,
    pub worker_id: u64,
    pub pipeline_instance_id: u64,
    pub pipeline_definition_id: u64,
    pub state: ResourceState,
}

/// The inter-segment transport endpoint for one named port.
///
/// The requested maps are owned by the control plane (kept in sync with the
/// live segment population); the actual maps are reported back by the owning
/// executor once attachments take effect. Keys are segment addresses, values
/// flag whether the segment is local to the manifold's executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifoldInstance {
    pub id: u64,
    pub port_name: String,
    pub pipeline_definition_id: u64,
    pub pipeline_instance_id: u64,
    pub executor_id: u64,
    pub requested_input_segments: BTreeMap<u64, bool>,
    pub requested_output_segments: BTreeMap<u64, bool>,
    pub actual_input_segments: BTreeMap<u64, bool>,
    pub actual_output_segments: BTreeMap<u64, bool>,
    pub state: ResourceState,
}
