//! The action vocabulary of the resource store.
//!
//! Every mutation of the normalized state is expressed as one of these
//! actions and applied through `Store::dispatch`. Actions carry ids and
//! prevalidated payloads only, never in-memory handles.

use std::collections::BTreeMap;

use crate::grpc;
use crate::models::{ActualStatus, ManifoldDef, PipelineMapping, RequestedStatus, ResourceKind, ResourceRef, SegmentDef};

/// A new worker record, id pre-allocated by the caller.
#[derive(Debug, Clone)]
pub struct NewWorker {
    pub id: u64,
    pub ucx_address: String,
    pub partition_address: String,
}

/// A prevalidated pipeline definition ready for registration.
#[derive(Debug, Clone)]
pub struct NewPipelineDefinition {
    /// Stable hash of the canonical encoded config.
    pub id: u64,
    pub config: grpc::PipelineConfiguration,
    pub segments: BTreeMap<String, SegmentDef>,
    pub manifolds: BTreeMap<String, ManifoldDef>,
}

/// A named store action.
#[derive(Debug, Clone)]
pub enum Action {
    /// Open a request barrier span.
    StartRequest { id: String },
    /// Close a request barrier span.
    StopRequest { id: String },

    ConnectionsAdd { id: u64, peer_info: String },
    /// Tear down an executor and everything it owns (stream closed).
    ConnectionsDropOne { id: u64 },
    ConnectionsRemove { id: u64, cascade: bool },
    ConnectionsUpdateRequestedStatus { id: u64, status: RequestedStatus },
    ConnectionsUpdateActualStatus { id: u64, status: ActualStatus },

    WorkersAddMany { executor_id: u64, workers: Vec<NewWorker> },
    WorkersAdd { executor_id: u64, worker: NewWorker },
    WorkersRemove { id: u64, cascade: bool },
    WorkersUpdateRequestedStatus { id: u64, status: RequestedStatus },
    WorkersUpdateActualStatus { id: u64, status: ActualStatus },

    PipelineDefinitionsCreateOrUpdate { definition: NewPipelineDefinition },
    PipelineDefinitionsSetMapping { definition_id: u64, mapping: PipelineMapping },

    PipelineInstancesAdd { id: u64, definition_id: u64, executor_id: u64 },
    PipelineInstancesRemove { id: u64, cascade: bool },
    PipelineInstancesUpdateRequestedStatus { id: u64, status: RequestedStatus },
    PipelineInstancesUpdateActualStatus { id: u64, status: ActualStatus },

    SegmentInstancesAdd { id: u64, name: String, pipeline_instance_id: u64, worker_id: u64 },
    SegmentInstancesRemove { id: u64, cascade: bool },
    SegmentInstancesUpdateRequestedStatus { id: u64, status: RequestedStatus },
    SegmentInstancesUpdateActualStatus { id: u64, status: ActualStatus },
    /// Explicit stop entry point for a segment.
    SegmentInstancesRequestStop { id: u64 },

    ManifoldInstancesAdd { id: u64, port_name: String, pipeline_instance_id: u64 },
    ManifoldInstancesRemove { id: u64, cascade: bool },
    ManifoldInstancesUpdateRequestedStatus { id: u64, status: RequestedStatus },
    ManifoldInstancesUpdateActualStatus { id: u64, status: ActualStatus },
    /// Reconcile a manifold's requested maps with the live segment population.
    ManifoldInstancesSyncSegments { id: u64 },
    /// Detach one segment address from a manifold's requested maps.
    ManifoldInstancesDetachRequestedSegment { id: u64, segment_address: u64 },
    /// Record the actual attachments reported by the owning executor.
    ManifoldInstancesUpdateActualSegments {
        id: u64,
        inputs: BTreeMap<u64, bool>,
        outputs: BTreeMap<u64, bool>,
    },

    AddDependee { owner: ResourceRef, dependee: ResourceRef },
    RemoveDependee { owner: ResourceRef, dependee: ResourceRef },
}

impl Action {
    /// A short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartRequest { .. } => "startRequest",
            Self::StopRequest { .. } => "stopRequest",
            Self::ConnectionsAdd { .. } => "connectionsAdd",
            Self::ConnectionsDropOne { .. } => "connectionsDropOne",
            Self::ConnectionsRemove { .. } => "connectionsRemove",
            Self::ConnectionsUpdateRequestedStatus { .. } => "connectionsUpdateRequestedStatus",
            Self::ConnectionsUpdateActualStatus { .. } => "connectionsUpdateActualStatus",
            Self::WorkersAddMany { .. } => "workersAddMany",
            Self::WorkersAdd { .. } => "workersAdd",
            Self::WorkersRemove { .. } => "workersRemove",
            Self::WorkersUpdateRequestedStatus { .. } => "workersUpdateRequestedStatus",
            Self::WorkersUpdateActualStatus { .. } => "workersUpdateActualStatus",
            Self::PipelineDefinitionsCreateOrUpdate { .. } => "pipelineDefinitionsCreateOrUpdate",
            Self::PipelineDefinitionsSetMapping { .. } => "pipelineDefinitionsSetMapping",
            Self::PipelineInstancesAdd { .. } => "pipelineInstancesAdd",
            Self::PipelineInstancesRemove { .. } => "pipelineInstancesRemove",
            Self::PipelineInstancesUpdateRequestedStatus { .. } => "pipelineInstancesUpdateRequestedStatus",
            Self::PipelineInstancesUpdateActualStatus { .. } => "pipelineInstancesUpdateActualStatus",
            Self::SegmentInstancesAdd { .. } => "segmentInstancesAdd",
            Self::SegmentInstancesRemove { .. } => "segmentInstancesRemove",
            Self::SegmentInstancesUpdateRequestedStatus { .. } => "segmentInstancesUpdateRequestedStatus",
            Self::SegmentInstancesUpdateActualStatus { .. } => "segmentInstancesUpdateActualStatus",
            Self::SegmentInstancesRequestStop { .. } => "segmentInstancesRequestStop",
            Self::ManifoldInstancesAdd { .. } => "manifoldInstancesAdd",
            Self::ManifoldInstancesRemove { .. } => "manifoldInstancesRemove",
            Self::ManifoldInstancesUpdateRequestedStatus { .. } => "manifoldInstancesUpdateRequestedStatus",
            Self::ManifoldInstancesUpdateActualStatus { .. } => "manifoldInstancesUpdateActualStatus",
            Self::ManifoldInstancesSyncSegments { .. } => "manifoldInstancesSyncSegments",
            Self::ManifoldInstancesDetachRequestedSegment { .. } => "manifoldInstancesDetachRequestedSegment",
            Self::ManifoldInstancesUpdateActualSegments { .. } => "manifoldInstancesUpdateActualSegments",
            Self::AddDependee { .. } => "addDependee",
            Self::RemoveDependee { .. } => "removeDependee",
        }
    }

    /// Build the requested-status update for the given resource family.
    ///
    /// Pipeline definitions carry no lifecycle; asking for one is a watcher
    /// bug and fatal by policy.
    pub fn update_requested(kind: ResourceKind, id: u64, status: RequestedStatus) -> Self {
        match kind {
            ResourceKind::Connections => Self::ConnectionsUpdateRequestedStatus { id, status },
            ResourceKind::Workers => Self::WorkersUpdateRequestedStatus { id, status },
            ResourceKind::PipelineInstances => Self::PipelineInstancesUpdateRequestedStatus { id, status },
            ResourceKind::SegmentInstances => Self::SegmentInstancesUpdateRequestedStatus { id, status },
            ResourceKind::ManifoldInstances => Self::ManifoldInstancesUpdateRequestedStatus { id, status },
            ResourceKind::PipelineDefinitions => unreachable!("pipeline definitions have no lifecycle"),
        }
    }

    /// Build the actual-status update for the given resource family.
    pub fn update_actual(kind: ResourceKind, id: u64, status: ActualStatus) -> Self {
        match kind {
            ResourceKind::Connections => Self::ConnectionsUpdateActualStatus { id, status },
            ResourceKind::Workers => Self::WorkersUpdateActualStatus { id, status },
            ResourceKind::PipelineInstances => Self::PipelineInstancesUpdateActualStatus { id, status },
            ResourceKind::SegmentInstances => Self::SegmentInstancesUpdateActualStatus { id, status },
            ResourceKind::ManifoldInstances => Self::ManifoldInstancesUpdateActualStatus { id, status },
            ResourceKind::PipelineDefinitions => unreachable!("pipeline definitions have no lifecycle"),
        }
    }

    /// Build the remove action for the given resource family.
    pub fn remove(kind: ResourceKind, id: u64, cascade: bool) -> Self {
        match kind {
            ResourceKind::Connections => Self::ConnectionsRemove { id, cascade },
            ResourceKind::Workers => Self::WorkersRemove { id, cascade },
            ResourceKind::PipelineInstances => Self::PipelineInstancesRemove { id, cascade },
            ResourceKind::SegmentInstances => Self::SegmentInstancesRemove { id, cascade },
            ResourceKind::ManifoldInstances => Self::ManifoldInstancesRemove { id, cascade },
            ResourceKind::PipelineDefinitions => unreachable!("pipeline definitions are not removable"),
        }
    }
}
