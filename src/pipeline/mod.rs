//! Pipeline definition handling.
//!
//! Configurations arrive over the event stream, are validated and frozen into
//! definitions, and placements (mappings) are expanded into segment instances
//! on the named workers.

pub mod manifolds;

#[cfg(test)]
mod manifolds_test;

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::grpc;
use crate::models::{ManifoldDef, PipelineMapping, SegmentDef, SegmentMapping};
use crate::store::actions::NewPipelineDefinition;
use crate::utils;

/// Validate a client-supplied configuration and freeze it into a definition.
///
/// The definition id is a stable hash of the canonical encoded config, so an
/// identical registration is idempotent.
pub fn build_definition(config: &grpc::PipelineConfiguration) -> Result<NewPipelineDefinition, AppError> {
    if config.segments.is_empty() {
        return Err(AppError::InvalidArgument("pipeline config declares no segments".into()));
    }

    let mut segments: BTreeMap<String, SegmentDef> = BTreeMap::new();
    let mut manifolds: BTreeMap<String, ManifoldDef> = BTreeMap::new();
    for manifold in &config.manifolds {
        if manifold.name.is_empty() {
            return Err(AppError::InvalidArgument("manifold with empty name in pipeline config".into()));
        }
        manifolds.insert(
            manifold.name.clone(),
            ManifoldDef {
                port_name: manifold.name.clone(),
            },
        );
    }
    for segment in &config.segments {
        if segment.name.is_empty() {
            return Err(AppError::InvalidArgument("segment with empty name in pipeline config".into()));
        }
        if segments.contains_key(&segment.name) {
            return Err(AppError::InvalidArgument(format!("duplicate segment name '{}' in pipeline config", segment.name)));
        }
        // Ports referenced by segments implicitly declare their manifolds.
        for port in segment.ingress_ports.iter().chain(segment.egress_ports.iter()) {
            manifolds.entry(port.clone()).or_insert_with(|| ManifoldDef { port_name: port.clone() });
        }
        segments.insert(
            segment.name.clone(),
            SegmentDef {
                name: segment.name.clone(),
                ingress_ports: segment.ingress_ports.clone(),
                egress_ports: segment.egress_ports.clone(),
            },
        );
    }

    let encoded = utils::encode_model(config).map_err(AppError::Internal)?;
    Ok(NewPipelineDefinition {
        id: utils::stable_hash_64(&encoded),
        config: config.clone(),
        segments,
        manifolds,
    })
}

/// Normalize a wire mapping against the calling executor.
///
/// An `executor_id` of `0` is replaced by the caller; a non-zero id that
/// disagrees with the caller is rejected.
pub fn mapping_from_wire(caller_executor_id: u64, wire: &grpc::PipelineMapping) -> Result<PipelineMapping, AppError> {
    let executor_id = match wire.executor_id {
        0 => caller_executor_id,
        id if id == caller_executor_id => id,
        id => {
            return Err(AppError::InvalidArgument(format!(
                "mapping names executor {} but the calling executor is {}",
                id, caller_executor_id,
            )))
        }
    };
    let mut segments = BTreeMap::new();
    for (name, mapping) in &wire.segments {
        if mapping.worker_ids.is_empty() {
            return Err(AppError::InvalidArgument(format!("mapping for segment '{}' names no workers", name)));
        }
        segments.insert(
            name.clone(),
            SegmentMapping {
                segment_name: mapping.segment_name.clone(),
                worker_ids: mapping.worker_ids.clone(),
            },
        );
    }
    Ok(PipelineMapping { executor_id, segments })
}

/// Expand a mapping into the `(segment name, worker id)` pairs to instantiate.
pub fn placements(mapping: &PipelineMapping) -> Vec<(String, u64)> {
    let mut placements = Vec::new();
    for (name, segment) in &mapping.segments {
        for worker_id in &segment.worker_ids {
            placements.push((name.clone(), *worker_id));
        }
    }
    placements
}
