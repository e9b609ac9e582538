//! Core data models of the control plane.

mod entities;

pub use entities::{
    Executor, ManifoldDef, ManifoldInstance, PipelineDefinition, PipelineInstance, PipelineMapping, SegmentDef, SegmentInstance, SegmentMapping,
    Worker,
};

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// The requested status lattice of a resource.
///
/// Transitions are monotone non-decreasing; the derived `Ord` follows
/// declaration order, which is the lattice order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequestedStatus {
    Initialized,
    Created,
    Running,
    Completed,
    Stopped,
    Destroyed,
}

/// The actual status lattice of a resource, reported by its owning executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActualStatus {
    Unknown,
    Creating,
    Created,
    Running,
    Completed,
    Stopping,
    Stopped,
    Destroying,
    Destroyed,
}

/// The six entity kinds tracked by the resource store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Connections,
    Workers,
    PipelineDefinitions,
    PipelineInstances,
    SegmentInstances,
    ManifoldInstances,
}

impl ResourceKind {
    /// The wire discriminator for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connections => "Connections",
            Self::Workers => "Workers",
            Self::PipelineDefinitions => "PipelineDefinitions",
            Self::PipelineInstances => "PipelineInstances",
            Self::SegmentInstances => "SegmentInstances",
            Self::ManifoldInstances => "ManifoldInstances",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val {
            "Connections" => Ok(Self::Connections),
            "Workers" => Ok(Self::Workers),
            "PipelineDefinitions" => Ok(Self::PipelineDefinitions),
            "PipelineInstances" => Ok(Self::PipelineInstances),
            "SegmentInstances" => Ok(Self::SegmentInstances),
            "ManifoldInstances" => Ok(Self::ManifoldInstances),
            _ => Err(AppError::InvalidArgument(format!("unknown resource type '{}'", val))),
        }
    }
}

/// A typed reference to a resource, always by id, never by in-memory handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: u64,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// The lifecycle state shared by every live resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    /// The status the control plane wants this resource to reach.
    pub requested: RequestedStatus,
    /// The status the owning executor last reported.
    pub actual: ActualStatus,
    /// Resources registered against this one to keep it alive.
    pub dependees: Vec<ResourceRef>,
    /// Reciprocal mirror of `dependees` on the other side of each edge.
    pub dependers: Vec<ResourceRef>,
}

impl ResourceState {
    /// The number of dependees currently holding this resource alive.
    pub fn ref_count(&self) -> usize {
        self.dependees.len()
    }
}

impl Default for RequestedStatus {
    fn default() -> Self {
        Self::Initialized
    }
}

impl Default for ActualStatus {
    fn default() -> Self {
        Self::Unknown
    }
}
