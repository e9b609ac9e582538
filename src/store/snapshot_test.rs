use std::collections::HashSet;

use anyhow::Result;

use crate::fixtures;
use crate::grpc;
use crate::models::ActualStatus;
use crate::store::{snapshot, Action, Store};

/// Assert that every id list matches its entity map and that every cross-id
/// reference in the snapshot resolves within the snapshot.
fn assert_referential_integrity(state: &grpc::ControlPlaneState) {
    let executors = state.executors.as_ref().unwrap();
    let workers = state.workers.as_ref().unwrap();
    let definitions = state.pipeline_definitions.as_ref().unwrap();
    let instances = state.pipeline_instances.as_ref().unwrap();
    let segments = state.segment_instances.as_ref().unwrap();
    let manifolds = state.manifold_instances.as_ref().unwrap();

    let executor_ids: HashSet<u64> = executors.ids.iter().copied().collect();
    let worker_ids: HashSet<u64> = workers.ids.iter().copied().collect();
    let definition_ids: HashSet<u64> = definitions.ids.iter().copied().collect();
    let instance_ids: HashSet<u64> = instances.ids.iter().copied().collect();
    let segment_ids: HashSet<u64> = segments.ids.iter().copied().collect();
    let manifold_ids: HashSet<u64> = manifolds.ids.iter().copied().collect();

    assert_eq!(executor_ids, executors.entities.keys().copied().collect::<HashSet<u64>>());
    assert_eq!(worker_ids, workers.entities.keys().copied().collect::<HashSet<u64>>());
    assert_eq!(definition_ids, definitions.entities.keys().copied().collect::<HashSet<u64>>());
    assert_eq!(instance_ids, instances.entities.keys().copied().collect::<HashSet<u64>>());
    assert_eq!(segment_ids, segments.entities.keys().copied().collect::<HashSet<u64>>());
    assert_eq!(manifold_ids, manifolds.entities.keys().copied().collect::<HashSet<u64>>());

    for executor in executors.entities.values() {
        for id in &executor.worker_ids {
            assert!(worker_ids.contains(id), "executor {} references missing worker {}", executor.id, id);
        }
        for id in &executor.assigned_pipeline_ids {
            assert!(instance_ids.contains(id), "executor {} references missing pipeline {}", executor.id, id);
        }
        for id in &executor.mapped_pipeline_definition_ids {
            assert!(definition_ids.contains(id), "executor {} references missing definition {}", executor.id, id);
        }
    }
    for worker in workers.entities.values() {
        assert!(executor_ids.contains(&worker.executor_id), "worker {} references missing executor", worker.id);
        for id in &worker.assigned_segment_ids {
            assert!(segment_ids.contains(id), "worker {} references missing segment {}", worker.id, id);
        }
    }
    for definition in definitions.entities.values() {
        for id in &definition.instance_ids {
            assert!(instance_ids.contains(id), "definition {} references missing instance {}", definition.id, id);
        }
        for executor_id in definition.mappings.keys() {
            assert!(executor_ids.contains(executor_id), "definition {} maps missing executor {}", definition.id, executor_id);
        }
    }
    for instance in instances.entities.values() {
        assert!(definition_ids.contains(&instance.definition_id));
        assert!(executor_ids.contains(&instance.executor_id));
        for id in &instance.segment_ids {
            assert!(segment_ids.contains(id), "instance {} references missing segment {}", instance.id, id);
        }
        for id in &instance.manifold_ids {
            assert!(manifold_ids.contains(id), "instance {} references missing manifold {}", instance.id, id);
        }
    }
    for segment in segments.entities.values() {
        assert!(executor_ids.contains(&segment.executor_id));
        assert!(worker_ids.contains(&segment.worker_id));
        assert!(instance_ids.contains(&segment.pipeline_instance_id));
        assert!(definition_ids.contains(&segment.pipeline_definition_id));
    }
    for manifold in manifolds.entities.values() {
        assert!(definition_ids.contains(&manifold.pipeline_definition_id));
        assert!(instance_ids.contains(&manifold.pipeline_instance_id));
        assert!(executor_ids.contains(&manifold.executor_id));
    }
}

fn populated_store() -> Result<Store> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 2)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    Ok(store)
}

#[test]
fn wire_snapshot_is_referentially_consistent() -> Result<()> {
    let store = populated_store()?;
    let snapshot = snapshot::control_plane_state(store.state());
    assert_eq!(snapshot.nonce, store.nonce(), "snapshot must carry the state nonce");
    assert_referential_integrity(&snapshot);
    Ok(())
}

#[test]
fn wire_snapshot_stays_consistent_across_a_cascade() -> Result<()> {
    let mut store = populated_store()?;
    let executor_id = *store.state().executors.keys().next().unwrap();
    store.dispatch(Action::ConnectionsDropOne { id: executor_id })?;
    let snapshot = snapshot::control_plane_state(store.state());
    assert_referential_integrity(&snapshot);
    assert!(snapshot.executors.unwrap().ids.is_empty());
    Ok(())
}

#[test]
fn snapshot_payload_round_trips() -> Result<()> {
    let store = populated_store()?;
    let payload = snapshot::state_update_payload(store.state())?;
    let update: grpc::StateUpdate = grpc::unpack(&payload)?;
    let state = update.state.expect("broadcast payload must carry the state");
    assert_eq!(state.nonce, store.nonce());
    assert_eq!(state, snapshot::control_plane_state(store.state()), "decoded snapshot must equal the built one");
    Ok(())
}

#[test]
fn dependee_edges_mirror_on_the_wire() -> Result<()> {
    let store = populated_store()?;
    let snapshot = snapshot::control_plane_state(store.state());
    let segments = snapshot.segment_instances.as_ref().unwrap();
    let manifolds = snapshot.manifold_instances.as_ref().unwrap();

    let mut mirrored = 0;
    for segment in segments.entities.values() {
        let state = segment.state.as_ref().unwrap();
        for dependee in &state.dependees {
            let manifold = manifolds.entities.get(&dependee.id).expect("dependee manifold must exist");
            let back = manifold.state.as_ref().unwrap();
            assert!(
                back.dependers.iter().any(|re| re.id == segment.id),
                "manifold {} must mirror segment {} as a depender",
                manifold.id,
                segment.id,
            );
            mirrored += 1;
        }
    }
    assert!(mirrored > 0, "expected at least one dependee edge in the populated store");
    Ok(())
}
