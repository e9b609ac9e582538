use std::collections::BTreeSet;

use crate::models::{ActualStatus, RequestedStatus, ResourceKind, ResourceRef};
use crate::pipeline::manifolds;
use crate::store::{selectors, Action, Effects, StoreState};
use crate::watchers::Lifecycle;

/// Segment lifecycle.
///
/// Segments drive manifold synthesis when they come up and manifold detach
/// when they wind down; `requested` only reaches `Stopped` once the last
/// manifold releases the segment.
pub struct SegmentInstancesWatcher;

impl Lifecycle for SegmentInstancesWatcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SegmentInstances
    }

    fn on_created(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        manifolds::synthesize(state, id, fx);
        fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Running));
    }

    fn on_completed(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        release_or_detach(id, state, fx);
    }

    fn on_stopping(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        release_or_detach(id, state, fx);
    }

    fn on_stopped(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        // Re-sync the manifolds serving this segment's ports; the segment is
        // no longer live, so the sync detaches it everywhere.
        if let Some(segment) = selectors::segment_instance(state, id) {
            if let Some(seg_def) = selectors::segment_def(state, segment.pipeline_definition_id, &segment.name) {
                let ports: BTreeSet<&String> = seg_def.ingress_ports.iter().chain(seg_def.egress_ports.iter()).collect();
                for port_name in ports {
                    for manifold in selectors::manifolds_for_port(state, segment.pipeline_definition_id, port_name) {
                        fx.push(Action::ManifoldInstancesSyncSegments { id: manifold.id });
                    }
                }
            }
        }
        fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Destroyed));
    }

    fn on_dependees_changed(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        // Once the last manifold lets go of a winding-down segment, it may
        // stop.
        if let Some(st) = state.resource_state(ResourceRef::new(self.kind(), id)) {
            if st.dependees.is_empty() && st.actual >= ActualStatus::Completed && st.requested < RequestedStatus::Stopped {
                fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Stopped));
            }
        }
    }
}

/// Move the segment toward `Stopped`: directly when unreferenced, otherwise
/// by detaching it from each dependee manifold, whose release then completes
/// the transition.
fn release_or_detach(id: u64, state: &StoreState, fx: &mut Effects) {
    let re = ResourceRef::new(ResourceKind::SegmentInstances, id);
    let st = match state.resource_state(re) {
        Some(st) => st,
        None => return,
    };
    if st.dependees.is_empty() {
        if st.requested < RequestedStatus::Stopped {
            fx.push(Action::update_requested(ResourceKind::SegmentInstances, id, RequestedStatus::Stopped));
        }
        return;
    }
    let segment = match selectors::segment_instance(state, id) {
        Some(segment) => segment,
        None => return,
    };
    for dep in st.dependees.iter().filter(|dep| dep.kind == ResourceKind::ManifoldInstances) {
        fx.push(Action::ManifoldInstancesDetachRequestedSegment {
            id: dep.id,
            segment_address: segment.segment_address,
        });
    }
}
