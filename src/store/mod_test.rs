use anyhow::Result;

use crate::error::AppError;
use crate::fixtures;
use crate::models::{ActualStatus, RequestedStatus, ResourceKind, ResourceRef};
use crate::store::{selectors, Action, DispatchError};

fn expect_rejected(res: std::result::Result<(), DispatchError>) -> AppError {
    match res {
        Err(DispatchError::Rejected(err)) => err,
        Err(DispatchError::Listener(err)) => panic!("expected rejection, got listener failure: {}", err),
        Ok(_) => panic!("expected rejection, dispatch succeeded"),
    }
}

#[test]
fn nonce_increments_on_every_commit() -> Result<()> {
    let mut store = fixtures::store_bare();
    let nonce0 = store.nonce();
    fixtures::connect_executor(&mut store)?;
    assert!(store.nonce() > nonce0, "expected nonce above {} got {}", nonce0, store.nonce());
    Ok(())
}

#[test]
fn request_barrier_toggles_flag_and_bumps_nonce() -> Result<()> {
    let mut store = fixtures::store_bare();
    store.dispatch(Action::StartRequest { id: "t/1".into() })?;
    assert!(store.state().system.request_running, "expected request flag to be set");
    assert_eq!(store.state().system.request_running_nonce, 1);
    assert_eq!(store.state().system.current_request.as_deref(), Some("t/1"));
    store.dispatch(Action::StopRequest { id: "t/1".into() })?;
    assert!(!store.state().system.request_running, "expected request flag to be cleared");
    assert_eq!(store.state().system.request_running_nonce, 2);
    Ok(())
}

#[test]
fn requested_status_is_monotone() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    store.dispatch(Action::ConnectionsUpdateRequestedStatus {
        id: executor_id,
        status: RequestedStatus::Running,
    })?;

    let err = expect_rejected(store.dispatch(Action::ConnectionsUpdateRequestedStatus {
        id: executor_id,
        status: RequestedStatus::Created,
    }));
    assert!(matches!(err, AppError::InvalidTransition(_)), "expected InvalidTransition got {:?}", err);
    let state = selectors::executor(store.state(), executor_id).unwrap();
    assert_eq!(state.state.requested, RequestedStatus::Running, "state must be unchanged after rejection");
    Ok(())
}

#[test]
fn actual_status_requires_requested_prerequisite() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;

    // `Created` may not be reported before creation was requested.
    let err = expect_rejected(store.dispatch(Action::ConnectionsUpdateActualStatus {
        id: executor_id,
        status: ActualStatus::Created,
    }));
    assert!(matches!(err, AppError::InvalidTransition(_)), "expected InvalidTransition got {:?}", err);

    store.dispatch(Action::ConnectionsUpdateRequestedStatus {
        id: executor_id,
        status: RequestedStatus::Created,
    })?;
    store.dispatch(Action::ConnectionsUpdateActualStatus {
        id: executor_id,
        status: ActualStatus::Created,
    })?;
    Ok(())
}

#[test]
fn actual_stopping_is_accepted_without_stop_request() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    store.dispatch(Action::WorkersUpdateActualStatus {
        id: worker_ids[0],
        status: ActualStatus::Stopping,
    })?;
    let worker = selectors::worker(store.state(), worker_ids[0]).unwrap();
    assert_eq!(worker.state.actual, ActualStatus::Stopping);
    Ok(())
}

#[test]
fn explicit_remove_requires_destroyed() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;

    let err = expect_rejected(store.dispatch(Action::WorkersRemove {
        id: worker_ids[0],
        cascade: false,
    }));
    assert!(matches!(err, AppError::InvalidTransition(_)), "expected InvalidTransition got {:?}", err);
    assert!(selectors::worker(store.state(), worker_ids[0]).is_some(), "worker must survive a rejected removal");
    Ok(())
}

#[test]
fn segment_add_requires_all_parents() -> Result<()> {
    let mut store = fixtures::store_bare();

    // No pipeline instance at all.
    let err = expect_rejected(store.dispatch(Action::SegmentInstancesAdd {
        id: 999,
        name: "source".into(),
        pipeline_instance_id: 42,
        worker_id: 1,
    }));
    assert!(matches!(err, AppError::InvalidArgument(_)), "expected InvalidArgument got {:?}", err);

    // Full bringup, then an unknown worker.
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, instance_id, _segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let err = expect_rejected(store.dispatch(Action::SegmentInstancesAdd {
        id: 1000,
        name: "source".into(),
        pipeline_instance_id: instance_id,
        worker_id: 424242,
    }));
    assert!(matches!(err, AppError::InvalidArgument(_)), "expected InvalidArgument got {:?}", err);

    // Unknown segment name.
    let err = expect_rejected(store.dispatch(Action::SegmentInstancesAdd {
        id: 1001,
        name: "no-such-segment".into(),
        pipeline_instance_id: instance_id,
        worker_id: worker_ids[0],
    }));
    assert!(matches!(err, AppError::InvalidArgument(_)), "expected InvalidArgument got {:?}", err);
    Ok(())
}

#[test]
fn worker_removal_cascades_to_segments_in_one_dispatch() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, instance_id, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    assert_eq!(segments.len(), 2);

    store.dispatch(Action::WorkersRemove {
        id: worker_ids[0],
        cascade: true,
    })?;

    assert!(selectors::worker(store.state(), worker_ids[0]).is_none(), "worker must be removed");
    for (name, id) in &segments {
        assert!(
            selectors::segment_instance(store.state(), *id).is_none(),
            "segment '{}' must be removed by the worker cascade",
            name,
        );
    }
    let instance = selectors::pipeline_instance(store.state(), instance_id).unwrap();
    assert!(instance.segment_ids.is_empty(), "instance must hold no dangling segment ids");
    Ok(())
}

#[test]
fn disconnect_cascade_removes_everything_owned() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 2)?;
    let (_def, instance_id, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;

    // Drive the source segment up so a manifold is synthesized.
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    assert!(!store.state().manifold_instances.is_empty(), "expected a synthesized manifold");

    store.dispatch(Action::ConnectionsDropOne { id: executor_id })?;

    assert!(store.state().executors.is_empty(), "executor must be removed");
    assert!(store.state().workers.is_empty(), "workers must be removed");
    assert!(store.state().pipeline_instances.is_empty(), "pipeline instances must be removed");
    assert!(store.state().segment_instances.is_empty(), "segments must be removed");
    assert!(store.state().manifold_instances.is_empty(), "manifolds must be removed");
    assert!(
        selectors::pipeline_instance(store.state(), instance_id).is_none(),
        "instance lookup must observe the removal",
    );
    // The definition survives, but the executor's mapping is gone.
    for def in store.state().pipeline_definitions.values() {
        assert!(!def.mappings.contains_key(&executor_id), "mappings for the executor must be dropped");
        assert!(def.instance_ids.is_empty(), "definition must hold no dangling instance ids");
    }
    Ok(())
}

#[test]
fn dependee_edges_are_reciprocal() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let owner = ResourceRef::new(ResourceKind::SegmentInstances, segments[0].1);
    let dependee = ResourceRef::new(ResourceKind::SegmentInstances, segments[1].1);

    store.dispatch(Action::AddDependee { owner, dependee })?;
    let owner_state = store.state().resource_state(owner).unwrap();
    let dependee_state = store.state().resource_state(dependee).unwrap();
    assert!(owner_state.dependees.contains(&dependee), "owner must record the dependee");
    assert!(dependee_state.dependers.contains(&owner), "dependee must mirror the edge as a depender");
    assert_eq!(owner_state.ref_count(), 1);

    store.dispatch(Action::RemoveDependee { owner, dependee })?;
    let owner_state = store.state().resource_state(owner).unwrap();
    assert!(owner_state.dependees.is_empty(), "edge must be gone after removal");

    // Removing from an entity with zero dependees is an error.
    let err = expect_rejected(store.dispatch(Action::RemoveDependee { owner, dependee }));
    assert!(matches!(err, AppError::InvalidArgument(_)), "expected InvalidArgument got {:?}", err);
    Ok(())
}

#[test]
fn detach_of_absent_segment_is_a_silent_noop() -> Result<()> {
    let mut store = fixtures::store_bare();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, instance_id, _segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let manifold_id = store.allocate_id();
    store.dispatch(Action::ManifoldInstancesAdd {
        id: manifold_id,
        port_name: "frames".into(),
        pipeline_instance_id: instance_id,
    })?;

    let nonce = store.nonce();
    store.dispatch(Action::ManifoldInstancesDetachRequestedSegment {
        id: manifold_id,
        segment_address: 0xdead_beef,
    })?;
    assert_eq!(store.nonce(), nonce, "a no-op detach must not commit anything");
    Ok(())
}

#[test]
fn manifold_sync_is_idempotent() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    let manifold_id = *store.state().manifold_instances.keys().next().unwrap();

    let before = store.state().clone();
    store.dispatch(Action::ManifoldInstancesSyncSegments { id: manifold_id })?;
    let mut after = store.state().clone();
    // The nonce may advance; everything else must be untouched.
    after.system = before.system.clone();
    assert_eq!(before, after, "a repeated sync with an unchanged population must be a no-op");
    Ok(())
}
