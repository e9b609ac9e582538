//! The manifold synthesizer.
//!
//! Given a segment instance that has reached `Created`, derive the manifolds
//! its port topology requires, creating missing ones in the segment's
//! pipeline instance and re-syncing every manifold serving the same port
//! across the fleet. Synthesis is idempotent.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ActualStatus, ManifoldInstance, RequestedStatus};
use crate::store::{selectors, Action, Effects, StoreState};

/// The attachment set a manifold's requested maps should converge to.
#[derive(Debug, Default, PartialEq)]
pub struct DesiredAttachments {
    /// Segment addresses feeding the manifold (their egress port matches).
    pub inputs: BTreeMap<u64, bool>,
    /// Segment addresses fed by the manifold (their ingress port matches).
    pub outputs: BTreeMap<u64, bool>,
    /// The ids of every segment appearing in either map.
    pub segment_ids: BTreeSet<u64>,
}

/// Whether a segment still participates in manifold attachment.
fn is_live(actual: ActualStatus, requested: RequestedStatus) -> bool {
    actual < ActualStatus::Stopping && requested < RequestedStatus::Stopped
}

/// Compute the attachment set for the given manifold from the current
/// segment population. Pure; the sync reducer applies the result.
pub fn desired_attachments(state: &StoreState, manifold: &ManifoldInstance) -> DesiredAttachments {
    let mut desired = DesiredAttachments::default();
    let def = match selectors::pipeline_definition(state, manifold.pipeline_definition_id) {
        Some(def) => def,
        None => return desired,
    };
    for segment in state.segment_instances.values() {
        if segment.pipeline_definition_id != manifold.pipeline_definition_id {
            continue;
        }
        if !is_live(segment.state.actual, segment.state.requested) {
            continue;
        }
        let seg_def = match def.segments.get(&segment.name) {
            Some(seg_def) => seg_def,
            None => continue,
        };
        let is_local = segment.executor_id == manifold.executor_id;
        if seg_def.egress_ports.iter().any(|port| *port == manifold.port_name) {
            desired.inputs.insert(segment.segment_address, is_local);
            desired.segment_ids.insert(segment.id);
        }
        if seg_def.ingress_ports.iter().any(|port| *port == manifold.port_name) {
            desired.outputs.insert(segment.segment_address, is_local);
            desired.segment_ids.insert(segment.id);
        }
    }
    desired
}

/// Derive and reconcile the manifolds required by the given segment.
///
/// Missing manifolds are created in the segment's own pipeline instance;
/// every manifold serving one of the required ports fleet-wide is then
/// re-synced so its requested maps pick up the new segment.
pub fn synthesize(state: &StoreState, segment_id: u64, fx: &mut Effects) {
    let segment = match selectors::segment_instance(state, segment_id) {
        Some(segment) => segment,
        None => return,
    };
    let seg_def = match selectors::segment_def(state, segment.pipeline_definition_id, &segment.name) {
        Some(seg_def) => seg_def,
        None => {
            tracing::warn!(segment = %segment.name, definition = segment.pipeline_definition_id, "segment has no definition entry, skipping manifold synthesis");
            return;
        }
    };

    let required: BTreeSet<&String> = seg_def.ingress_ports.iter().chain(seg_def.egress_ports.iter()).collect();
    for port_name in required {
        let mut created = None;
        if selectors::manifold_for_instance_port(state, segment.pipeline_instance_id, port_name).is_none() {
            let id = fx.allocate_id();
            fx.push(Action::ManifoldInstancesAdd {
                id,
                port_name: port_name.clone(),
                pipeline_instance_id: segment.pipeline_instance_id,
            });
            created = Some(id);
        }
        for manifold in selectors::manifolds_for_port(state, segment.pipeline_definition_id, port_name) {
            fx.push(Action::ManifoldInstancesSyncSegments { id: manifold.id });
        }
        if let Some(id) = created {
            fx.push(Action::ManifoldInstancesSyncSegments { id });
        }
    }
}
