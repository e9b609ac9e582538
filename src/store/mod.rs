//! The normalized resource store.
//!
//! A single aggregate value mutated only through named actions. `dispatch`
//! applies an action, expands cascades so that every child removal is its own
//! committed action, and runs the registered watchers after each commit.
//! Watchers react by enqueueing follow-up actions, which are processed in
//! order before `dispatch` returns: one dispatch drains the whole reaction
//! chain, which is what makes the single-writer scheduling model hold.

pub mod actions;
pub mod selectors;
pub mod snapshot;
mod state;

#[cfg(test)]
mod mod_test;
#[cfg(test)]
mod snapshot_test;

use std::collections::VecDeque;

use thiserror::Error;

use crate::error::AppError;
use crate::models::{ActualStatus, RequestedStatus, ResourceKind, ResourceRef};
pub use actions::Action;
pub use state::{StoreState, SystemState};

/// A record of what one committed action changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Nothing changed (tolerated no-op).
    Noop,
    /// A request barrier span opened or closed.
    Barrier { running: bool },
    Added {
        kind: ResourceKind,
        id: u64,
    },
    Removed {
        kind: ResourceKind,
        id: u64,
    },
    RequestedChanged {
        kind: ResourceKind,
        id: u64,
        prev: RequestedStatus,
        new: RequestedStatus,
    },
    ActualChanged {
        kind: ResourceKind,
        id: u64,
        prev: ActualStatus,
        new: ActualStatus,
    },
    MappingSet {
        definition_id: u64,
        executor_id: u64,
    },
    DependeeAdded {
        owner: ResourceRef,
        dependee: ResourceRef,
    },
    DependeeRemoved {
        owner: ResourceRef,
        dependee: ResourceRef,
    },
    /// A manifold's requested maps were reconciled; the vecs carry the
    /// segments whose dependee edges were added/removed.
    ManifoldSynced {
        id: u64,
        attached: Vec<ResourceRef>,
        detached: Vec<ResourceRef>,
    },
    ActualAssignmentsUpdated {
        id: u64,
    },
}

/// The follow-up channel handed to watchers.
pub struct Effects<'a> {
    actions: &'a mut VecDeque<Queued>,
    next_id: &'a mut u64,
}

impl<'a> Effects<'a> {
    /// Enqueue a follow-up action, processed after the ones already queued.
    pub fn push(&mut self, action: Action) {
        self.actions.push_back(Queued {
            action,
            expanded: false,
            root: false,
        });
    }

    /// Allocate a fresh process-unique resource id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = *self.next_id;
        *self.next_id += 1;
        id
    }
}

/// A post-commit listener on the store's action stream.
pub trait Watcher: Send + Sync {
    fn on_action(&self, action: &Action, applied: &Applied, state: &StoreState, fx: &mut Effects);
}

/// Error from a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The root action was rejected; the state is unchanged.
    #[error(transparent)]
    Rejected(AppError),
    /// A cascade or watcher follow-up failed after mutations had already
    /// committed. The state is internally consistent but the caller should
    /// treat the session as poisoned.
    #[error("listener failure after commit: {0}")]
    Listener(AppError),
}

impl DispatchError {
    /// Whether mutations had already committed when the failure occurred.
    pub fn is_listener(&self) -> bool {
        matches!(self, Self::Listener(_))
    }

    pub fn into_app_error(self) -> AppError {
        match self {
            Self::Rejected(err) => err,
            Self::Listener(err) => err,
        }
    }
}

struct Queued {
    action: Action,
    /// Set once cascade expansion has run for this entry.
    expanded: bool,
    /// The action handed to `dispatch`, as opposed to a follow-up.
    root: bool,
}

/// The authoritative store: state plus registered watchers.
pub struct Store {
    state: StoreState,
    watchers: Vec<Box<dyn Watcher>>,
    next_id: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Store {
    pub fn new(watchers: Vec<Box<dyn Watcher>>) -> Self {
        Self {
            state: StoreState::default(),
            watchers,
            next_id: 1,
        }
    }

    /// The current state snapshot.
    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// The current state nonce.
    pub fn nonce(&self) -> u64 {
        self.state.system.nonce
    }

    /// Allocate a fresh process-unique resource id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Atomically apply the action, cascades included, then drain every
    /// watcher-driven follow-up before returning.
    pub fn dispatch(&mut self, action: Action) -> Result<(), DispatchError> {
        let mut queue: VecDeque<Queued> = VecDeque::new();
        queue.push_back(Queued {
            action,
            expanded: false,
            root: true,
        });
        let mut committed = 0usize;

        while let Some(next) = queue.pop_front() {
            if !next.expanded {
                if let Some(replacement) = expansion(&self.state, &next.action) {
                    for entry in replacement.into_iter().rev() {
                        queue.push_front(Queued {
                            root: next.root && entry.1,
                            action: entry.0,
                            expanded: entry.1,
                        });
                    }
                    continue;
                }
            }

            let applied = match self.state.apply(&next.action) {
                Ok(applied) => applied,
                Err(err) => {
                    // Watcher follow-ups may legitimately race a cascade
                    // removal; a vanished target is not a failure.
                    if !next.root && matches!(err, AppError::NotFound { .. }) {
                        tracing::debug!(action = next.action.label(), error = %err, "follow-up action target is gone, skipping");
                        continue;
                    }
                    if next.root && committed == 0 {
                        return Err(DispatchError::Rejected(err));
                    }
                    tracing::error!(action = next.action.label(), error = %err, "store listener follow-up failed after commit");
                    return Err(DispatchError::Listener(err));
                }
            };
            if matches!(applied, Applied::Noop) {
                continue;
            }
            committed += 1;

            let Self {
                ref state,
                ref watchers,
                ref mut next_id,
            } = *self;
            let mut fx = Effects {
                actions: &mut queue,
                next_id,
            };
            for watcher in watchers {
                watcher.on_action(&next.action, &applied, state, &mut fx);
            }
        }
        Ok(())
    }
}

/// Compute the replacement sequence for actions that expand into several
/// committed actions: batched adds, and removals whose children must be
/// removed individually (so watchers fire for each) before the parent.
///
/// Returns `None` when the action applies as-is. The bool on each entry marks
/// it as already expanded.
fn expansion(state: &StoreState, action: &Action) -> Option<Vec<(Action, bool)>> {
    match action {
        Action::WorkersAddMany { executor_id, workers } => {
            if workers.is_empty() {
                return None;
            }
            Some(
                workers
                    .iter()
                    .map(|worker| {
                        (
                            Action::WorkersAdd {
                                executor_id: *executor_id,
                                worker: worker.clone(),
                            },
                            true,
                        )
                    })
                    .collect(),
            )
        }
        Action::ConnectionsDropOne { id } | Action::ConnectionsRemove { id, cascade: true } => {
            let mut children: Vec<(Action, bool)> = selectors::worker_ids_for_executor(state, *id)
                .into_iter()
                .map(|wid| (Action::WorkersRemove { id: wid, cascade: true }, false))
                .collect();
            children.extend(
                selectors::pipeline_instance_ids_for_executor(state, *id)
                    .into_iter()
                    .map(|pid| (Action::PipelineInstancesRemove { id: pid, cascade: true }, false)),
            );
            if children.is_empty() {
                return None;
            }
            children.push((action.clone(), true));
            Some(children)
        }
        Action::ConnectionsRemove { id, cascade: false } => {
            if !removal_gate_open(state, ResourceKind::Connections, *id) {
                return None;
            }
            expansion(state, &Action::ConnectionsRemove { id: *id, cascade: true }).map(|mut children| {
                // Keep the original (gated) removal as the final action.
                children.pop();
                children.push((action.clone(), true));
                children
            })
        }
        Action::WorkersRemove { id, cascade } => {
            if !*cascade && !removal_gate_open(state, ResourceKind::Workers, *id) {
                return None;
            }
            let children: Vec<(Action, bool)> = selectors::segment_ids_for_worker(state, *id)
                .into_iter()
                .map(|sid| (Action::SegmentInstancesRemove { id: sid, cascade: true }, false))
                .collect();
            if children.is_empty() {
                return None;
            }
            let mut replacement = children;
            replacement.push((action.clone(), true));
            Some(replacement)
        }
        Action::PipelineInstancesRemove { id, cascade } => {
            if !*cascade && !removal_gate_open(state, ResourceKind::PipelineInstances, *id) {
                return None;
            }
            let mut children: Vec<(Action, bool)> = selectors::segment_ids_for_pipeline_instance(state, *id)
                .into_iter()
                .map(|sid| (Action::SegmentInstancesRemove { id: sid, cascade: true }, false))
                .collect();
            children.extend(
                selectors::manifold_ids_for_pipeline_instance(state, *id)
                    .into_iter()
                    .map(|mid| (Action::ManifoldInstancesRemove { id: mid, cascade: true }, false)),
            );
            if children.is_empty() {
                return None;
            }
            children.push((action.clone(), true));
            Some(children)
        }
        Action::SegmentInstancesRemove { id, cascade } => {
            if !*cascade && !removal_gate_open(state, ResourceKind::SegmentInstances, *id) {
                return None;
            }
            // After the segment is gone, re-sync the manifolds that held it so
            // their watchers observe the shrunken attachment set.
            let manifolds: Vec<(Action, bool)> = selectors::manifold_dependees(state, ResourceRef::new(ResourceKind::SegmentInstances, *id))
                .into_iter()
                .map(|mid| (Action::ManifoldInstancesSyncSegments { id: mid }, false))
                .collect();
            if manifolds.is_empty() {
                return None;
            }
            let mut replacement = vec![(action.clone(), true)];
            replacement.extend(manifolds);
            Some(replacement)
        }
        _ => None,
    }
}

/// Whether an explicit removal would pass the destroyed gate.
fn removal_gate_open(state: &StoreState, kind: ResourceKind, id: u64) -> bool {
    state
        .resource_state(ResourceRef::new(kind, id))
        .map(|st| st.actual == ActualStatus::Destroyed)
        .unwrap_or(false)
}
