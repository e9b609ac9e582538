//! The normalized state aggregate and its transition functions.

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::models::{
    ActualStatus, Executor, ManifoldInstance, PipelineDefinition, PipelineInstance, PipelineMapping, RequestedStatus, ResourceKind, ResourceRef,
    ResourceState, SegmentInstance, Worker,
};
use crate::pipeline::manifolds;
use crate::store::actions::{Action, NewPipelineDefinition, NewWorker};
use crate::store::Applied;
use crate::utils;

/// Barrier bookkeeping, not part of any entity collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemState {
    /// Monotonic version of the state, bumped on every committed action.
    pub nonce: u64,
    /// Whether a request barrier span is currently open.
    pub request_running: bool,
    /// Bumped by one on every `startRequest` and `stopRequest`.
    pub request_running_nonce: u64,
    /// The identifier of the open request span, when any.
    pub current_request: Option<String>,
}

/// The authoritative normalized state of the control plane.
///
/// Mutated only through `apply`; read through the selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub executors: BTreeMap<u64, Executor>,
    pub workers: BTreeMap<u64, Worker>,
    pub pipeline_definitions: BTreeMap<u64, PipelineDefinition>,
    pub pipeline_instances: BTreeMap<u64, PipelineInstance>,
    pub segment_instances: BTreeMap<u64, SegmentInstance>,
    pub manifold_instances: BTreeMap<u64, ManifoldInstance>,
    pub system: SystemState,
}

/// Append `val` if not already present.
fn push_unique<T: PartialEq>(vec: &mut Vec<T>, val: T) {
    if !vec.contains(&val) {
        vec.push(val);
    }
}

/// Remove the first occurrence of `val`, if any.
fn remove_val<T: PartialEq>(vec: &mut Vec<T>, val: &T) {
    if let Some(idx) = vec.iter().position(|item| item == val) {
        vec.remove(idx);
    }
}

impl StoreState {
    /// Apply one action, returning a record of what changed.
    ///
    /// On error the state is unchanged. A successful apply commits the
    /// mutation and bumps the nonce.
    pub fn apply(&mut self, action: &Action) -> Result<Applied, AppError> {
        if !self.system.request_running && !matches!(action, Action::StartRequest { .. } | Action::StopRequest { .. }) {
            tracing::warn!(action = action.label(), "store mutation outside of a request span");
        }
        let applied = self.apply_inner(action)?;
        // Barrier bookkeeping versions the request span, not the state.
        if !matches!(applied, Applied::Noop | Applied::Barrier { .. }) {
            self.system.nonce += 1;
        }
        Ok(applied)
    }

    fn apply_inner(&mut self, action: &Action) -> Result<Applied, AppError> {
        match action {
            Action::StartRequest { id } => {
                self.system.request_running = true;
                self.system.request_running_nonce += 1;
                self.system.current_request = Some(id.clone());
                Ok(Applied::Barrier { running: true })
            }
            Action::StopRequest { .. } => {
                self.system.request_running = false;
                self.system.request_running_nonce += 1;
                self.system.current_request = None;
                Ok(Applied::Barrier { running: false })
            }

            Action::ConnectionsAdd { id, peer_info } => self.connections_add(*id, peer_info),
            Action::ConnectionsDropOne { id } => self.connections_remove(*id, true),
            Action::ConnectionsRemove { id, cascade } => self.connections_remove(*id, *cascade),
            Action::ConnectionsUpdateRequestedStatus { id, status } => self.update_requested(ResourceKind::Connections, *id, *status),
            Action::ConnectionsUpdateActualStatus { id, status } => self.update_actual(ResourceKind::Connections, *id, *status),

            // AddMany is expanded into individual adds by the dispatch loop.
            Action::WorkersAddMany { .. } => Ok(Applied::Noop),
            Action::WorkersAdd { executor_id, worker } => self.workers_add(*executor_id, worker),
            Action::WorkersRemove { id, cascade } => self.workers_remove(*id, *cascade),
            Action::WorkersUpdateRequestedStatus { id, status } => self.update_requested(ResourceKind::Workers, *id, *status),
            Action::WorkersUpdateActualStatus { id, status } => self.update_actual(ResourceKind::Workers, *id, *status),

            Action::PipelineDefinitionsCreateOrUpdate { definition } => self.pipeline_definitions_create_or_update(definition),
            Action::PipelineDefinitionsSetMapping { definition_id, mapping } => self.pipeline_definitions_set_mapping(*definition_id, mapping),

            Action::PipelineInstancesAdd { id, definition_id, executor_id } => self.pipeline_instances_add(*id, *definition_id, *executor_id),
            Action::PipelineInstancesRemove { id, cascade } => self.pipeline_instances_remove(*id, *cascade),
            Action::PipelineInstancesUpdateRequestedStatus { id, status } => self.update_requested(ResourceKind::PipelineInstances, *id, *status),
            Action::PipelineInstancesUpdateActualStatus { id, status } => self.update_actual(ResourceKind::PipelineInstances, *id, *status),

            Action::SegmentInstancesAdd {
                id,
                name,
                pipeline_instance_id,
                worker_id,
            } => self.segment_instances_add(*id, name, *pipeline_instance_id, *worker_id),
            Action::SegmentInstancesRemove { id, cascade } => self.segment_instances_remove(*id, *cascade),
            Action::SegmentInstancesUpdateRequestedStatus { id, status } => self.update_requested(ResourceKind::SegmentInstances, *id, *status),
            Action::SegmentInstancesUpdateActualStatus { id, status } => self.update_actual(ResourceKind::SegmentInstances, *id, *status),
            Action::SegmentInstancesRequestStop { id } => self.segment_instances_request_stop(*id),

            Action::ManifoldInstancesAdd { id, port_name, pipeline_instance_id } => self.manifold_instances_add(*id, port_name, *pipeline_instance_id),
            Action::ManifoldInstancesRemove { id, cascade } => self.manifold_instances_remove(*id, *cascade),
            Action::ManifoldInstancesUpdateRequestedStatus { id, status } => self.update_requested(ResourceKind::ManifoldInstances, *id, *status),
            Action::ManifoldInstancesUpdateActualStatus { id, status } => self.update_actual(ResourceKind::ManifoldInstances, *id, *status),
            Action::ManifoldInstancesSyncSegments { id } => self.manifold_instances_sync_segments(*id),
            Action::ManifoldInstancesDetachRequestedSegment { id, segment_address } => self.manifold_instances_detach(*id, *segment_address),
            Action::ManifoldInstancesUpdateActualSegments { id, inputs, outputs } => self.manifold_instances_update_actual_segments(*id, inputs, outputs),

            Action::AddDependee { owner, dependee } => self.add_dependee(*owner, *dependee),
            Action::RemoveDependee { owner, dependee } => self.remove_dependee(*owner, *dependee),
        }
    }

    //////////////////////////////////////////////////////////////////////////
    // Lifecycle state access ////////////////////////////////////////////////

    /// Resolve the lifecycle state of the given reference, if the entity
    /// exists and carries one.
    pub fn resource_state(&self, re: ResourceRef) -> Option<&ResourceState> {
        match re.kind {
            ResourceKind::Connections => self.executors.get(&re.id).map(|e| &e.state),
            ResourceKind::Workers => self.workers.get(&re.id).map(|e| &e.state),
            ResourceKind::PipelineInstances => self.pipeline_instances.get(&re.id).map(|e| &e.state),
            ResourceKind::SegmentInstances => self.segment_instances.get(&re.id).map(|e| &e.state),
            ResourceKind::ManifoldInstances => self.manifold_instances.get(&re.id).map(|e| &e.state),
            ResourceKind::PipelineDefinitions => None,
        }
    }

    fn resource_state_mut(&mut self, re: ResourceRef) -> Option<&mut ResourceState> {
        match re.kind {
            ResourceKind::Connections => self.executors.get_mut(&re.id).map(|e| &mut e.state),
            ResourceKind::Workers => self.workers.get_mut(&re.id).map(|e| &mut e.state),
            ResourceKind::PipelineInstances => self.pipeline_instances.get_mut(&re.id).map(|e| &mut e.state),
            ResourceKind::SegmentInstances => self.segment_instances.get_mut(&re.id).map(|e| &mut e.state),
            ResourceKind::ManifoldInstances => self.manifold_instances.get_mut(&re.id).map(|e| &mut e.state),
            ResourceKind::PipelineDefinitions => None,
        }
    }

    fn update_requested(&mut self, kind: ResourceKind, id: u64, status: RequestedStatus) -> Result<Applied, AppError> {
        let state = self.resource_state_mut(ResourceRef::new(kind, id)).ok_or(AppError::NotFound { kind, id })?;
        if status < state.requested {
            return Err(AppError::requested_regression(kind, id, state.requested, status));
        }
        let prev = state.requested;
        state.requested = status;
        Ok(Applied::RequestedChanged { kind, id, prev, new: status })
    }

    fn update_actual(&mut self, kind: ResourceKind, id: u64, status: ActualStatus) -> Result<Applied, AppError> {
        let state = self.resource_state_mut(ResourceRef::new(kind, id)).ok_or(AppError::NotFound { kind, id })?;
        if status < state.actual {
            return Err(AppError::actual_regression(kind, id, state.actual, status));
        }
        // Most actual transitions require the requested status to have reached
        // a prerequisite; `Stopping` may always be reported directly.
        let required = match status {
            ActualStatus::Unknown | ActualStatus::Stopping => None,
            ActualStatus::Creating | ActualStatus::Created => Some(RequestedStatus::Created),
            ActualStatus::Running | ActualStatus::Completed => Some(RequestedStatus::Running),
            ActualStatus::Stopped => {
                if state.actual >= ActualStatus::Stopping {
                    None
                } else {
                    Some(RequestedStatus::Stopped)
                }
            }
            ActualStatus::Destroying | ActualStatus::Destroyed => Some(RequestedStatus::Destroyed),
        };
        if let Some(required) = required {
            if state.requested < required {
                return Err(AppError::InvalidTransition(format!(
                    "{}/{} actual status {:?} requires requested status of at least {:?}, currently {:?}",
                    kind, id, status, required, state.requested,
                )));
            }
        }
        let prev = state.actual;
        state.actual = status;
        Ok(Applied::ActualChanged { kind, id, prev, new: status })
    }

    /// Check the destroyed gate for an explicit (non-cascade) removal.
    fn check_remove_gate(&self, kind: ResourceKind, id: u64, cascade: bool) -> Result<(), AppError> {
        if cascade {
            return Ok(());
        }
        let state = self.resource_state(ResourceRef::new(kind, id)).ok_or(AppError::NotFound { kind, id })?;
        if state.actual != ActualStatus::Destroyed {
            return Err(AppError::InvalidTransition(format!(
                "{}/{} may not be removed while actual status is {:?}",
                kind, id, state.actual,
            )));
        }
        Ok(())
    }

    /// Drop every dependee/depender edge touching the given resource,
    /// keeping the reciprocal sides consistent.
    fn unlink_resource_refs(&mut self, re: ResourceRef) {
        let (dependees, dependers) = match self.resource_state(re) {
            Some(state) => (state.dependees.clone(), state.dependers.clone()),
            None => return,
        };
        for other in dependees {
            if let Some(state) = self.resource_state_mut(other) {
                remove_val(&mut state.dependers, &re);
            }
        }
        for other in dependers {
            if let Some(state) = self.resource_state_mut(other) {
                remove_val(&mut state.dependees, &re);
            }
        }
    }

    //////////////////////////////////////////////////////////////////////////
    // Connections ///////////////////////////////////////////////////////////

    fn connections_add(&mut self, id: u64, peer_info: &str) -> Result<Applied, AppError> {
        if self.executors.contains_key(&id) {
            return Err(AppError::InvalidArgument(format!("executor {} already exists", id)));
        }
        self.executors.insert(
            id,
            Executor {
                id,
                peer_info: peer_info.to_string(),
                ..Default::default()
            },
        );
        Ok(Applied::Added {
            kind: ResourceKind::Connections,
            id,
        })
    }

    fn connections_remove(&mut self, id: u64, cascade: bool) -> Result<Applied, AppError> {
        if cascade && !self.executors.contains_key(&id) {
            return Ok(Applied::Noop);
        }
        self.check_remove_gate(ResourceKind::Connections, id, cascade)?;
        self.unlink_resource_refs(ResourceRef::new(ResourceKind::Connections, id));
        let executor = match self.executors.remove(&id) {
            Some(executor) => executor,
            None => return Err(AppError::NotFound { kind: ResourceKind::Connections, id }),
        };
        // Mappings targeting this executor die with it.
        for def_id in executor.mapped_pipeline_definition_ids {
            if let Some(def) = self.pipeline_definitions.get_mut(&def_id) {
                def.mappings.remove(&id);
            }
        }
        Ok(Applied::Removed {
            kind: ResourceKind::Connections,
            id,
        })
    }

    //////////////////////////////////////////////////////////////////////////
    // Workers ///////////////////////////////////////////////////////////////

    fn workers_add(&mut self, executor_id: u64, worker: &NewWorker) -> Result<Applied, AppError> {
        if !self.executors.contains_key(&executor_id) {
            return Err(AppError::NotFound {
                kind: ResourceKind::Connections,
                id: executor_id,
            });
        }
        if self.workers.contains_key(&worker.id) {
            return Err(AppError::InvalidArgument(format!("worker {} already exists", worker.id)));
        }
        self.workers.insert(
            worker.id,
            Worker {
                id: worker.id,
                executor_id,
                ucx_address: worker.ucx_address.clone(),
                partition_address: worker.partition_address.clone(),
                ..Default::default()
            },
        );
        if let Some(executor) = self.executors.get_mut(&executor_id) {
            push_unique(&mut executor.worker_ids, worker.id);
        }
        Ok(Applied::Added {
            kind: ResourceKind::Workers,
            id: worker.id,
        })
    }

    fn workers_remove(&mut self, id: u64, cascade: bool) -> Result<Applied, AppError> {
        if cascade && !self.workers.contains_key(&id) {
            return Ok(Applied::Noop);
        }
        self.check_remove_gate(ResourceKind::Workers, id, cascade)?;
        self.unlink_resource_refs(ResourceRef::new(ResourceKind::Workers, id));
        let worker = match self.workers.remove(&id) {
            Some(worker) => worker,
            None => return Err(AppError::NotFound { kind: ResourceKind::Workers, id }),
        };
        if let Some(executor) = self.executors.get_mut(&worker.executor_id) {
            remove_val(&mut executor.worker_ids, &id);
        }
        Ok(Applied::Removed {
            kind: ResourceKind::Workers,
            id,
        })
    }

    //////////////////////////////////////////////////////////////////////////
    // Pipeline definitions //////////////////////////////////////////////////

    fn pipeline_definitions_create_or_update(&mut self, definition: &NewPipelineDefinition) -> Result<Applied, AppError> {
        // The id is a content hash: an existing definition with the same id
        // is the same definition.
        if self.pipeline_definitions.contains_key(&definition.id) {
            return Ok(Applied::Noop);
        }
        self.pipeline_definitions.insert(
            definition.id,
            PipelineDefinition {
                id: definition.id,
                config: definition.config.clone(),
                segments: definition.segments.clone(),
                manifolds: definition.manifolds.clone(),
                mappings: Default::default(),
                instance_ids: Default::default(),
            },
        );
        Ok(Applied::Added {
            kind: ResourceKind::PipelineDefinitions,
            id: definition.id,
        })
    }

    fn pipeline_definitions_set_mapping(&mut self, definition_id: u64, mapping: &PipelineMapping) -> Result<Applied, AppError> {
        if !self.executors.contains_key(&mapping.executor_id) {
            return Err(AppError::NotFound {
                kind: ResourceKind::Connections,
                id: mapping.executor_id,
            });
        }
        let def = self.pipeline_definitions.get_mut(&definition_id).ok_or(AppError::NotFound {
            kind: ResourceKind::PipelineDefinitions,
            id: definition_id,
        })?;
        for segment_name in mapping.segments.keys() {
            if !def.segments.contains_key(segment_name) {
                return Err(AppError::InvalidArgument(format!(
                    "mapping names unknown segment '{}' for definition {}",
                    segment_name, definition_id,
                )));
            }
        }
        def.mappings.insert(mapping.executor_id, mapping.clone());
        if let Some(executor) = self.executors.get_mut(&mapping.executor_id) {
            push_unique(&mut executor.mapped_pipeline_definition_ids, definition_id);
        }
        Ok(Applied::MappingSet {
            definition_id,
            executor_id: mapping.executor_id,
        })
    }

    //////////////////////////////////////////////////////////////////////////
    // Pipeline instances ////////////////////////////////////////////////////

    fn pipeline_instances_add(&mut self, id: u64, definition_id: u64, executor_id: u64) -> Result<Applied, AppError> {
        let def = self.pipeline_definitions.get(&definition_id).ok_or(AppError::NotFound {
            kind: ResourceKind::PipelineDefinitions,
            id: definition_id,
        })?;
        if !def.mappings.contains_key(&executor_id) {
            return Err(AppError::InvalidArgument(format!(
                "definition {} has no mapping for executor {}",
                definition_id, executor_id,
            )));
        }
        if !self.executors.contains_key(&executor_id) {
            return Err(AppError::NotFound {
                kind: ResourceKind::Connections,
                id: executor_id,
            });
        }
        if self.pipeline_instances.contains_key(&id) {
            return Err(AppError::InvalidArgument(format!("pipeline instance {} already exists", id)));
        }
        self.pipeline_instances.insert(
            id,
            PipelineInstance {
                id,
                definition_id,
                executor_id,
                ..Default::default()
            },
        );
        if let Some(def) = self.pipeline_definitions.get_mut(&definition_id) {
            push_unique(&mut def.instance_ids, id);
        }
        if let Some(executor) = self.executors.get_mut(&executor_id) {
            push_unique(&mut executor.assigned_pipeline_ids, id);
        }
        Ok(Applied::Added {
            kind: ResourceKind::PipelineInstances,
            id,
        })
    }

    fn pipeline_instances_remove(&mut self, id: u64, cascade: bool) -> Result<Applied, AppError> {
        if cascade && !self.pipeline_instances.contains_key(&id) {
            return Ok(Applied::Noop);
        }
        self.check_remove_gate(ResourceKind::PipelineInstances, id, cascade)?;
        self.unlink_resource_refs(ResourceRef::new(ResourceKind::PipelineInstances, id));
        let instance = match self.pipeline_instances.remove(&id) {
            Some(instance) => instance,
            None => {
                return Err(AppError::NotFound {
                    kind: ResourceKind::PipelineInstances,
                    id,
                })
            }
        };
        if let Some(def) = self.pipeline_definitions.get_mut(&instance.definition_id) {
            remove_val(&mut def.instance_ids, &id);
        }
        if let Some(executor) = self.executors.get_mut(&instance.executor_id) {
            remove_val(&mut executor.assigned_pipeline_ids, &id);
        }
        Ok(Applied::Removed {
            kind: ResourceKind::PipelineInstances,
            id,
        })
    }

    //////////////////////////////////////////////////////////////////////////
    // Segment instances /////////////////////////////////////////////////////

    fn segment_instances_add(&mut self, id: u64, name: &str, pipeline_instance_id: u64, worker_id: u64) -> Result<Applied, AppError> {
        let instance = self
            .pipeline_instances
            .get(&pipeline_instance_id)
            .ok_or_else(|| AppError::InvalidArgument(format!("pipeline instance {} does not exist", pipeline_instance_id)))?;
        let def = self
            .pipeline_definitions
            .get(&instance.definition_id)
            .ok_or_else(|| AppError::InvalidArgument(format!("pipeline definition {} does not exist", instance.definition_id)))?;
        if !def.segments.contains_key(name) {
            return Err(AppError::InvalidArgument(format!(
                "definition {} declares no segment named '{}'",
                def.id, name,
            )));
        }
        let worker = self
            .workers
            .get(&worker_id)
            .ok_or_else(|| AppError::InvalidArgument(format!("worker {} does not exist", worker_id)))?;
        if !self.executors.contains_key(&instance.executor_id) {
            return Err(AppError::InvalidArgument(format!("executor {} does not exist", instance.executor_id)));
        }
        if worker.executor_id != instance.executor_id {
            return Err(AppError::InvalidArgument(format!(
                "worker {} belongs to executor {}, not executor {}",
                worker_id, worker.executor_id, instance.executor_id,
            )));
        }
        if self.segment_instances.contains_key(&id) {
            return Err(AppError::InvalidArgument(format!("segment instance {} already exists", id)));
        }
        let (definition_id, executor_id) = (instance.definition_id, instance.executor_id);
        let name_hash = utils::stable_hash_32(name.as_bytes());
        self.segment_instances.insert(
            id,
            SegmentInstance {
                id,
                name: name.to_string(),
                name_hash,
                segment_address: utils::encode_segment_address(name_hash, id),
                executor_id,
                worker_id,
                pipeline_instance_id,
                pipeline_definition_id: definition_id,
                ..Default::default()
            },
        );
        if let Some(worker) = self.workers.get_mut(&worker_id) {
            push_unique(&mut worker.assigned_segment_ids, id);
        }
        if let Some(instance) = self.pipeline_instances.get_mut(&pipeline_instance_id) {
            push_unique(&mut instance.segment_ids, id);
        }
        Ok(Applied::Added {
            kind: ResourceKind::SegmentInstances,
            id,
        })
    }

    fn segment_instances_remove(&mut self, id: u64, cascade: bool) -> Result<Applied, AppError> {
        if cascade && !self.segment_instances.contains_key(&id) {
            return Ok(Applied::Noop);
        }
        self.check_remove_gate(ResourceKind::SegmentInstances, id, cascade)?;
        self.unlink_resource_refs(ResourceRef::new(ResourceKind::SegmentInstances, id));
        let segment = match self.segment_instances.remove(&id) {
            Some(segment) => segment,
            None => {
                return Err(AppError::NotFound {
                    kind: ResourceKind::SegmentInstances,
                    id,
                })
            }
        };
        if let Some(worker) = self.workers.get_mut(&segment.worker_id) {
            remove_val(&mut worker.assigned_segment_ids, &id);
        }
        if let Some(instance) = self.pipeline_instances.get_mut(&segment.pipeline_instance_id) {
            remove_val(&mut instance.segment_ids, &id);
        }
        // A removed segment vanishes from every requested map it was still
        // attached to, in the same committed mutation.
        for manifold in self.manifold_instances.values_mut() {
            manifold.requested_input_segments.remove(&segment.segment_address);
            manifold.requested_output_segments.remove(&segment.segment_address);
        }
        Ok(Applied::Removed {
            kind: ResourceKind::SegmentInstances,
            id,
        })
    }

    fn segment_instances_request_stop(&mut self, id: u64) -> Result<Applied, AppError> {
        let state = self
            .resource_state_mut(ResourceRef::new(ResourceKind::SegmentInstances, id))
            .ok_or(AppError::NotFound {
                kind: ResourceKind::SegmentInstances,
                id,
            })?;
        if state.actual >= ActualStatus::Stopping {
            return Ok(Applied::Noop);
        }
        let prev = state.actual;
        state.actual = ActualStatus::Stopping;
        Ok(Applied::ActualChanged {
            kind: ResourceKind::SegmentInstances,
            id,
            prev,
            new: ActualStatus::Stopping,
        })
    }

    //////////////////////////////////////////////////////////////////////////
    // Manifold instances ////////////////////////////////////////////////////

    fn manifold_instances_add(&mut self, id: u64, port_name: &str, pipeline_instance_id: u64) -> Result<Applied, AppError> {
        let instance = self.pipeline_instances.get(&pipeline_instance_id).ok_or(AppError::NotFound {
            kind: ResourceKind::PipelineInstances,
            id: pipeline_instance_id,
        })?;
        if self.manifold_instances.contains_key(&id) {
            return Err(AppError::InvalidArgument(format!("manifold instance {} already exists", id)));
        }
        let (definition_id, executor_id) = (instance.definition_id, instance.executor_id);
        self.manifold_instances.insert(
            id,
            ManifoldInstance {
                id,
                port_name: port_name.to_string(),
                pipeline_definition_id: definition_id,
                pipeline_instance_id,
                executor_id,
                ..Default::default()
            },
        );
        if let Some(instance) = self.pipeline_instances.get_mut(&pipeline_instance_id) {
            push_unique(&mut instance.manifold_ids, id);
        }
        Ok(Applied::Added {
            kind: ResourceKind::ManifoldInstances,
            id,
        })
    }

    fn manifold_instances_remove(&mut self, id: u64, cascade: bool) -> Result<Applied, AppError> {
        if cascade && !self.manifold_instances.contains_key(&id) {
            return Ok(Applied::Noop);
        }
        self.check_remove_gate(ResourceKind::ManifoldInstances, id, cascade)?;
        self.unlink_resource_refs(ResourceRef::new(ResourceKind::ManifoldInstances, id));
        let manifold = match self.manifold_instances.remove(&id) {
            Some(manifold) => manifold,
            None => {
                return Err(AppError::NotFound {
                    kind: ResourceKind::ManifoldInstances,
                    id,
                })
            }
        };
        if let Some(instance) = self.pipeline_instances.get_mut(&manifold.pipeline_instance_id) {
            remove_val(&mut instance.manifold_ids, &id);
        }
        Ok(Applied::Removed {
            kind: ResourceKind::ManifoldInstances,
            id,
        })
    }

    /// Reconcile a manifold's requested maps and dependee edges with the live
    /// segment population. Idempotent: an unchanged population is a no-op
    /// apart from the nonce bump.
    fn manifold_instances_sync_segments(&mut self, id: u64) -> Result<Applied, AppError> {
        let manifold = match self.manifold_instances.get(&id) {
            Some(manifold) => manifold.clone(),
            // Sync is watcher-driven and may race a cascade removal.
            None => return Ok(Applied::Noop),
        };
        let desired = manifolds::desired_attachments(self, &manifold);
        let manifold_ref = ResourceRef::new(ResourceKind::ManifoldInstances, id);

        // Current attachments are the segment dependers of this manifold.
        let current: Vec<ResourceRef> = manifold
            .state
            .dependers
            .iter()
            .copied()
            .filter(|re| re.kind == ResourceKind::SegmentInstances)
            .collect();
        let attached: Vec<ResourceRef> = desired
            .segment_ids
            .iter()
            .map(|sid| ResourceRef::new(ResourceKind::SegmentInstances, *sid))
            .filter(|re| !current.contains(re))
            .collect();
        let detached: Vec<ResourceRef> = current.iter().copied().filter(|re| !desired.segment_ids.contains(&re.id)).collect();

        if let Some(manifold) = self.manifold_instances.get_mut(&id) {
            manifold.requested_input_segments = desired.inputs;
            manifold.requested_output_segments = desired.outputs;
        }
        for re in attached.iter().chain(detached.iter()) {
            // Mirror each edge on both sides.
            let adding = attached.contains(re);
            if let Some(state) = self.resource_state_mut(*re) {
                if adding {
                    push_unique(&mut state.dependees, manifold_ref);
                } else {
                    remove_val(&mut state.dependees, &manifold_ref);
                }
            }
            if let Some(state) = self.resource_state_mut(manifold_ref) {
                if adding {
                    push_unique(&mut state.dependers, *re);
                } else {
                    remove_val(&mut state.dependers, re);
                }
            }
        }
        Ok(Applied::ManifoldSynced { id, attached, detached })
    }

    /// Detach one segment address from a manifold's requested maps.
    ///
    /// A segment present in neither map is silently ignored.
    fn manifold_instances_detach(&mut self, id: u64, segment_address: u64) -> Result<Applied, AppError> {
        let manifold = self.manifold_instances.get_mut(&id).ok_or(AppError::NotFound {
            kind: ResourceKind::ManifoldInstances,
            id,
        })?;
        let removed_input = manifold.requested_input_segments.remove(&segment_address).is_some();
        let removed_output = manifold.requested_output_segments.remove(&segment_address).is_some();
        if !removed_input && !removed_output {
            return Ok(Applied::Noop);
        }
        let manifold_ref = ResourceRef::new(ResourceKind::ManifoldInstances, id);
        let segment_ref = self
            .segment_instances
            .values()
            .find(|seg| seg.segment_address == segment_address)
            .map(|seg| ResourceRef::new(ResourceKind::SegmentInstances, seg.id));
        let mut detached = Vec::new();
        if let Some(segment_ref) = segment_ref {
            if let Some(state) = self.resource_state_mut(segment_ref) {
                remove_val(&mut state.dependees, &manifold_ref);
            }
            if let Some(state) = self.resource_state_mut(manifold_ref) {
                remove_val(&mut state.dependers, &segment_ref);
            }
            detached.push(segment_ref);
        }
        Ok(Applied::ManifoldSynced {
            id,
            attached: Vec::new(),
            detached,
        })
    }

    fn manifold_instances_update_actual_segments(
        &mut self, id: u64, inputs: &BTreeMap<u64, bool>, outputs: &BTreeMap<u64, bool>,
    ) -> Result<Applied, AppError> {
        let manifold = self.manifold_instances.get_mut(&id).ok_or(AppError::NotFound {
            kind: ResourceKind::ManifoldInstances,
            id,
        })?;
        manifold.actual_input_segments = inputs.clone();
        manifold.actual_output_segments = outputs.clone();
        Ok(Applied::ActualAssignmentsUpdated { id })
    }

    //////////////////////////////////////////////////////////////////////////
    // Dependee edges ////////////////////////////////////////////////////////

    fn add_dependee(&mut self, owner: ResourceRef, dependee: ResourceRef) -> Result<Applied, AppError> {
        if self.resource_state(dependee).is_none() {
            return Err(AppError::NotFound {
                kind: dependee.kind,
                id: dependee.id,
            });
        }
        let state = self.resource_state_mut(owner).ok_or(AppError::NotFound {
            kind: owner.kind,
            id: owner.id,
        })?;
        if state.dependees.contains(&dependee) {
            return Ok(Applied::Noop);
        }
        state.dependees.push(dependee);
        if let Some(state) = self.resource_state_mut(dependee) {
            push_unique(&mut state.dependers, owner);
        }
        Ok(Applied::DependeeAdded { owner, dependee })
    }

    fn remove_dependee(&mut self, owner: ResourceRef, dependee: ResourceRef) -> Result<Applied, AppError> {
        let state = self.resource_state_mut(owner).ok_or(AppError::NotFound {
            kind: owner.kind,
            id: owner.id,
        })?;
        if state.dependees.is_empty() {
            return Err(AppError::InvalidArgument(format!("{} has no dependees to remove", owner)));
        }
        if !state.dependees.contains(&dependee) {
            return Err(AppError::InvalidArgument(format!("{} is not a dependee of {}", dependee, owner)));
        }
        remove_val(&mut state.dependees, &dependee);
        if let Some(state) = self.resource_state_mut(dependee) {
            remove_val(&mut state.dependers, &owner);
        }
        Ok(Applied::DependeeRemoved { owner, dependee })
    }
}
