//! Pure read-only selectors over the normalized state.

#![allow(dead_code)]

use crate::models::{
    Executor, ManifoldInstance, PipelineDefinition, PipelineInstance, ResourceKind, ResourceRef, SegmentDef, SegmentInstance, Worker,
};
use crate::store::StoreState;

pub fn executor(state: &StoreState, id: u64) -> Option<&Executor> {
    state.executors.get(&id)
}

pub fn worker(state: &StoreState, id: u64) -> Option<&Worker> {
    state.workers.get(&id)
}

pub fn pipeline_definition(state: &StoreState, id: u64) -> Option<&PipelineDefinition> {
    state.pipeline_definitions.get(&id)
}

pub fn pipeline_instance(state: &StoreState, id: u64) -> Option<&PipelineInstance> {
    state.pipeline_instances.get(&id)
}

pub fn segment_instance(state: &StoreState, id: u64) -> Option<&SegmentInstance> {
    state.segment_instances.get(&id)
}

pub fn manifold_instance(state: &StoreState, id: u64) -> Option<&ManifoldInstance> {
    state.manifold_instances.get(&id)
}

/// The ids of all workers belonging to the given executor.
pub fn worker_ids_for_executor(state: &StoreState, executor_id: u64) -> Vec<u64> {
    state
        .workers
        .values()
        .filter(|worker| worker.executor_id == executor_id)
        .map(|worker| worker.id)
        .collect()
}

/// The ids of all pipeline instances assigned to the given executor.
pub fn pipeline_instance_ids_for_executor(state: &StoreState, executor_id: u64) -> Vec<u64> {
    state
        .pipeline_instances
        .values()
        .filter(|instance| instance.executor_id == executor_id)
        .map(|instance| instance.id)
        .collect()
}

/// The ids of all segment instances assigned to the given worker.
pub fn segment_ids_for_worker(state: &StoreState, worker_id: u64) -> Vec<u64> {
    state
        .segment_instances
        .values()
        .filter(|segment| segment.worker_id == worker_id)
        .map(|segment| segment.id)
        .collect()
}

/// The ids of all segment instances within the given pipeline instance.
pub fn segment_ids_for_pipeline_instance(state: &StoreState, pipeline_instance_id: u64) -> Vec<u64> {
    state
        .segment_instances
        .values()
        .filter(|segment| segment.pipeline_instance_id == pipeline_instance_id)
        .map(|segment| segment.id)
        .collect()
}

/// The ids of all manifold instances within the given pipeline instance.
pub fn manifold_ids_for_pipeline_instance(state: &StoreState, pipeline_instance_id: u64) -> Vec<u64> {
    state
        .manifold_instances
        .values()
        .filter(|manifold| manifold.pipeline_instance_id == pipeline_instance_id)
        .map(|manifold| manifold.id)
        .collect()
}

/// The manifold ids among the given resource's dependees.
pub fn manifold_dependees(state: &StoreState, re: ResourceRef) -> Vec<u64> {
    state
        .resource_state(re)
        .map(|st| {
            st.dependees
                .iter()
                .filter(|dep| dep.kind == ResourceKind::ManifoldInstances)
                .map(|dep| dep.id)
                .collect()
        })
        .unwrap_or_default()
}

/// Find a segment instance by its combined address.
pub fn segment_by_address(state: &StoreState, segment_address: u64) -> Option<&SegmentInstance> {
    state.segment_instances.values().find(|segment| segment.segment_address == segment_address)
}

/// Find segment instances by `(name, pipeline_definition_id)`.
pub fn segments_by_name<'a>(state: &'a StoreState, definition_id: u64, name: &'a str) -> Vec<&'a SegmentInstance> {
    state
        .segment_instances
        .values()
        .filter(|segment| segment.pipeline_definition_id == definition_id && segment.name == name)
        .collect()
}

/// All manifolds serving the given `(name, pipeline_definition_id)` port
/// across the fleet.
pub fn manifolds_for_port<'a>(state: &'a StoreState, definition_id: u64, port_name: &str) -> Vec<&'a ManifoldInstance> {
    state
        .manifold_instances
        .values()
        .filter(|manifold| manifold.pipeline_definition_id == definition_id && manifold.port_name == port_name)
        .collect()
}

/// The manifold serving the given port within one pipeline instance, if any.
pub fn manifold_for_instance_port<'a>(state: &'a StoreState, pipeline_instance_id: u64, port_name: &str) -> Option<&'a ManifoldInstance> {
    state
        .manifold_instances
        .values()
        .find(|manifold| manifold.pipeline_instance_id == pipeline_instance_id && manifold.port_name == port_name)
}

/// The segment definition backing the given segment name.
pub fn segment_def<'a>(state: &'a StoreState, definition_id: u64, name: &str) -> Option<&'a SegmentDef> {
    state.pipeline_definitions.get(&definition_id).and_then(|def| def.segments.get(name))
}
