//! Lifecycle watchers.
//!
//! One watcher per resource family, registered on the store's action stream.
//! Each fires a hook the first time a resource's actual status crosses a
//! lattice threshold, and reacts to dependee releases. Hook defaults encode
//! the standard lifecycle: prompt creation on add, advance to running once
//! created, wind down to stopped once completed and unreferenced, destroy
//! once stopped, remove once destroyed.

mod connections;
mod manifolds;
mod pipelines;
mod segments;
mod workers;

#[cfg(test)]
mod mod_test;

pub use connections::ConnectionsWatcher;
pub use manifolds::ManifoldInstancesWatcher;
pub use pipelines::PipelineInstancesWatcher;
pub use segments::SegmentInstancesWatcher;
pub use workers::WorkersWatcher;

use crate::models::{ActualStatus, RequestedStatus, ResourceKind, ResourceRef};
use crate::store::{Action, Applied, Effects, StoreState, Watcher};

/// Lifecycle hooks for one resource family.
///
/// Implementors override only the hooks whose defaults do not apply to their
/// family.
pub trait Lifecycle: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// A resource was added; prompt the owning executor to build it.
    fn on_add(&self, id: u64, _state: &StoreState, fx: &mut Effects) {
        fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Created));
    }

    /// The executor reported the resource as created.
    fn on_created(&self, id: u64, _state: &StoreState, fx: &mut Effects) {
        fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Running));
    }

    /// The executor reported the resource as running.
    fn on_running(&self, _id: u64, _state: &StoreState, _fx: &mut Effects) {}

    /// The executor reported the resource as completed.
    fn on_completed(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        release_if_unreferenced(self.kind(), id, state, fx);
    }

    /// The resource began stopping, explicitly or by its own report.
    fn on_stopping(&self, _id: u64, _state: &StoreState, _fx: &mut Effects) {}

    /// The executor reported the resource as stopped.
    fn on_stopped(&self, id: u64, _state: &StoreState, fx: &mut Effects) {
        fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Destroyed));
    }

    /// The resource reached `Destroyed`; drop it from the store.
    fn on_destroyed(&self, id: u64, _state: &StoreState, fx: &mut Effects) {
        fx.push(Action::remove(self.kind(), id, false));
    }

    /// A dependee edge of this resource was released.
    fn on_dependees_changed(&self, _id: u64, _state: &StoreState, _fx: &mut Effects) {}

    /// A manifold sync touched this resource (manifold families only).
    fn on_synced(&self, _id: u64, _state: &StoreState, _fx: &mut Effects) {}
}

/// Move a winding-down resource to `Stopped` once nothing holds it alive.
pub(crate) fn release_if_unreferenced(kind: ResourceKind, id: u64, state: &StoreState, fx: &mut Effects) {
    if let Some(st) = state.resource_state(ResourceRef::new(kind, id)) {
        if st.dependees.is_empty() && st.requested < RequestedStatus::Stopped {
            fx.push(Action::update_requested(kind, id, RequestedStatus::Stopped));
        }
    }
}

/// Adapter driving a `Lifecycle` implementation from the action stream.
pub struct LifecycleWatcher<L: Lifecycle>(pub L);

impl<L: Lifecycle> Watcher for LifecycleWatcher<L> {
    fn on_action(&self, _action: &Action, applied: &Applied, state: &StoreState, fx: &mut Effects) {
        let kind = self.0.kind();
        match applied {
            Applied::Added { kind: k, id } if *k == kind => self.0.on_add(*id, state, fx),
            Applied::ActualChanged { kind: k, id, prev, new } if *k == kind => {
                // Fire each threshold crossed by this transition exactly once.
                // The constructive hooks only fire while the new status is
                // itself constructive: a resource that jumps straight into
                // wind-down never pretended to be created or running.
                if *new <= ActualStatus::Completed {
                    if *prev < ActualStatus::Created && *new >= ActualStatus::Created {
                        self.0.on_created(*id, state, fx);
                    }
                    if *prev < ActualStatus::Running && *new >= ActualStatus::Running {
                        self.0.on_running(*id, state, fx);
                    }
                    if *prev < ActualStatus::Completed && *new >= ActualStatus::Completed {
                        self.0.on_completed(*id, state, fx);
                    }
                }
                if *prev < ActualStatus::Stopping && *new >= ActualStatus::Stopping {
                    self.0.on_stopping(*id, state, fx);
                }
                if *prev < ActualStatus::Stopped && *new >= ActualStatus::Stopped {
                    self.0.on_stopped(*id, state, fx);
                }
                if *prev < ActualStatus::Destroyed && *new >= ActualStatus::Destroyed {
                    self.0.on_destroyed(*id, state, fx);
                }
            }
            Applied::DependeeRemoved { owner, .. } if owner.kind == kind => self.0.on_dependees_changed(owner.id, state, fx),
            Applied::ManifoldSynced { id, detached, .. } => {
                for re in detached {
                    if re.kind == kind {
                        self.0.on_dependees_changed(re.id, state, fx);
                    }
                }
                if kind == ResourceKind::ManifoldInstances {
                    self.0.on_synced(*id, state, fx);
                }
            }
            _ => {}
        }
    }
}

/// The full watcher set registered by the coordinator.
pub fn all() -> Vec<Box<dyn Watcher>> {
    vec![
        Box::new(LifecycleWatcher(ConnectionsWatcher)),
        Box::new(LifecycleWatcher(WorkersWatcher)),
        Box::new(LifecycleWatcher(PipelineInstancesWatcher)),
        Box::new(LifecycleWatcher(SegmentInstancesWatcher)),
        Box::new(LifecycleWatcher(ManifoldInstancesWatcher)),
    ]
}
