//! Full-state snapshot construction.
//!
//! Snapshots are built once per broadcast and shared across sessions; only
//! the encoded payload is cloned into each outbound queue.

use crate::error::AppError;
use crate::grpc;
use crate::models;
use crate::store::StoreState;

impl From<&models::Executor> for grpc::Executor {
    fn from(val: &models::Executor) -> Self {
        Self {
            id: val.id,
            peer_info: val.peer_info.clone(),
            worker_ids: val.worker_ids.clone(),
            assigned_pipeline_ids: val.assigned_pipeline_ids.clone(),
            mapped_pipeline_definition_ids: val.mapped_pipeline_definition_ids.clone(),
            state: Some(grpc::ResourceState::from(&val.state)),
        }
    }
}

impl From<&models::Worker> for grpc::Worker {
    fn from(val: &models::Worker) -> Self {
        Self {
            id: val.id,
            executor_id: val.executor_id,
            ucx_address: val.ucx_address.clone(),
            partition_address: val.partition_address.clone(),
            assigned_segment_ids: val.assigned_segment_ids.clone(),
            state: Some(grpc::ResourceState::from(&val.state)),
        }
    }
}

impl From<&models::SegmentDef> for grpc::SegmentDefinition {
    fn from(val: &models::SegmentDef) -> Self {
        Self {
            name: val.name.clone(),
            ingress_ports: val.ingress_ports.clone(),
            egress_ports: val.egress_ports.clone(),
        }
    }
}

impl From<&models::ManifoldDef> for grpc::ManifoldDefinition {
    fn from(val: &models::ManifoldDef) -> Self {
        Self {
            port_name: val.port_name.clone(),
        }
    }
}

impl From<&models::SegmentMapping> for grpc::SegmentMapping {
    fn from(val: &models::SegmentMapping) -> Self {
        Self {
            segment_name: val.segment_name.clone(),
            worker_ids: val.worker_ids.clone(),
        }
    }
}

impl From<&models::PipelineMapping> for grpc::PipelineMapping {
    fn from(val: &models::PipelineMapping) -> Self {
        Self {
            executor_id: val.executor_id,
            segments: val.segments.iter().map(|(name, mapping)| (name.clone(), mapping.into())).collect(),
        }
    }
}

impl From<&models::PipelineDefinition> for grpc::PipelineDefinition {
    fn from(val: &models::PipelineDefinition) -> Self {
        Self {
            id: val.id,
            config: Some(val.config.clone()),
            segments: val.segments.iter().map(|(name, def)| (name.clone(), def.into())).collect(),
            manifolds: val.manifolds.iter().map(|(name, def)| (name.clone(), def.into())).collect(),
            mappings: val.mappings.iter().map(|(id, mapping)| (*id, mapping.into())).collect(),
            instance_ids: val.instance_ids.clone(),
        }
    }
}

impl From<&models::PipelineInstance> for grpc::PipelineInstance {
    fn from(val: &models::PipelineInstance) -> Self {
        Self {
            id: val.id,
            definition_id: val.definition_id,
            executor_id: val.executor_id,
            segment_ids: val.segment_ids.clone(),
            manifold_ids: val.manifold_ids.clone(),
            state: Some(grpc::ResourceState::from(&val.state)),
        }
    }
}

impl From<&models::SegmentInstance> for grpc::SegmentInstance {
    fn from(val: &models::SegmentInstance) -> Self {
        Self {
            id: val.id,
            name: val.name.clone(),
            name_hash: val.name_hash,
            segment_address: val.segment_address,
            executor_id: val.executor_id,
            worker_id: val.worker_id,
            pipeline_instance_id: val.pipeline_instance_id,
            pipeline_definition_id: val.pipeline_definition_id,
            state: Some(grpc::ResourceState::from(&val.state)),
        }
    }
}

impl From<&models::ManifoldInstance> for grpc::ManifoldInstance {
    fn from(val: &models::ManifoldInstance) -> Self {
        Self {
            id: val.id,
            port_name: val.port_name.clone(),
            pipeline_definition_id: val.pipeline_definition_id,
            pipeline_instance_id: val.pipeline_instance_id,
            executor_id: val.executor_id,
            requested_input_segments: val.requested_input_segments.iter().map(|(k, v)| (*k, *v)).collect(),
            requested_output_segments: val.requested_output_segments.iter().map(|(k, v)| (*k, *v)).collect(),
            actual_input_segments: val.actual_input_segments.iter().map(|(k, v)| (*k, *v)).collect(),
            actual_output_segments: val.actual_output_segments.iter().map(|(k, v)| (*k, *v)).collect(),
            state: Some(grpc::ResourceState::from(&val.state)),
        }
    }
}

/// Build the full wire snapshot of the given state.
pub fn control_plane_state(state: &StoreState) -> grpc::ControlPlaneState {
    grpc::ControlPlaneState {
        executors: Some(grpc::ExecutorsCollection {
            ids: state.executors.keys().copied().collect(),
            entities: state.executors.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        workers: Some(grpc::WorkersCollection {
            ids: state.workers.keys().copied().collect(),
            entities: state.workers.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        pipeline_definitions: Some(grpc::PipelineDefinitionsCollection {
            ids: state.pipeline_definitions.keys().copied().collect(),
            entities: state.pipeline_definitions.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        pipeline_instances: Some(grpc::PipelineInstancesCollection {
            ids: state.pipeline_instances.keys().copied().collect(),
            entities: state.pipeline_instances.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        segment_instances: Some(grpc::SegmentInstancesCollection {
            ids: state.segment_instances.keys().copied().collect(),
            entities: state.segment_instances.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        manifold_instances: Some(grpc::ManifoldInstancesCollection {
            ids: state.manifold_instances.keys().copied().collect(),
            entities: state.manifold_instances.iter().map(|(id, val)| (*id, val.into())).collect(),
        }),
        nonce: state.system.nonce,
    }
}

/// Build and pack the `StateUpdate` payload for broadcast, serialized once.
pub fn state_update_payload(state: &StoreState) -> Result<::prost_types::Any, AppError> {
    grpc::pack(&grpc::StateUpdate {
        state: Some(control_plane_state(state)),
    })
}
