use crate::models::{ActualStatus, RequestedStatus, ResourceKind};
use crate::store::{selectors, Action, Effects, StoreState};
use crate::watchers::Lifecycle;

/// Manifold lifecycle.
///
/// Manifolds are synthesized rather than client-declared; a manifold whose
/// requested maps both drain empty has no reason to exist and is destroyed.
pub struct ManifoldInstancesWatcher;

impl Lifecycle for ManifoldInstancesWatcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ManifoldInstances
    }

    fn on_synced(&self, id: u64, state: &StoreState, fx: &mut Effects) {
        let manifold = match selectors::manifold_instance(state, id) {
            Some(manifold) => manifold,
            None => return,
        };
        if manifold.requested_input_segments.is_empty()
            && manifold.requested_output_segments.is_empty()
            && manifold.state.requested < RequestedStatus::Destroyed
        {
            // The destroy sequence: request destruction, force the terminal
            // actual status, and let the destroyed hook remove the record.
            fx.push(Action::update_requested(self.kind(), id, RequestedStatus::Destroyed));
            fx.push(Action::update_actual(self.kind(), id, ActualStatus::Destroyed));
        }
    }
}
