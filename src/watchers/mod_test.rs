use anyhow::Result;

use crate::fixtures;
use crate::models::{ActualStatus, RequestedStatus, ResourceKind, ResourceRef};
use crate::store::{selectors, Action, Store};

/// Drive the linear pipeline up to the point where the source segment has
/// been created and its manifold synthesized.
fn bringup_with_source_created(store: &mut Store) -> Result<(u64, u64, u64, u64, u64)> {
    let executor_id = fixtures::connect_executor(store)?;
    let worker_ids = fixtures::register_workers(store, executor_id, 2)?;
    let (_def, instance_id, segments) = fixtures::bringup_linear_pipeline(store, executor_id, &worker_ids)?;
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    let sink_id = segments.iter().find(|(name, _)| name == "sink").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    let manifold_id = *store
        .state()
        .manifold_instances
        .keys()
        .next()
        .expect("expected a synthesized manifold");
    Ok((executor_id, instance_id, source_id, sink_id, manifold_id))
}

#[test]
fn add_prompts_creation() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;

    let executor = selectors::executor(store.state(), executor_id).unwrap();
    assert_eq!(executor.state.requested, RequestedStatus::Created, "executor creation must be requested on add");
    let worker = selectors::worker(store.state(), worker_ids[0]).unwrap();
    assert_eq!(worker.state.requested, RequestedStatus::Created, "worker creation must be requested on add");
    assert_eq!(worker.state.actual, ActualStatus::Unknown, "actual status is owned by the executor");
    Ok(())
}

#[test]
fn worker_lifecycle_defaults() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let id = worker_ids[0];

    store.dispatch(Action::WorkersUpdateActualStatus { id, status: ActualStatus::Created })?;
    assert_eq!(selectors::worker(store.state(), id).unwrap().state.requested, RequestedStatus::Running);

    store.dispatch(Action::WorkersUpdateActualStatus { id, status: ActualStatus::Running })?;
    store.dispatch(Action::WorkersUpdateActualStatus { id, status: ActualStatus::Completed })?;
    assert_eq!(selectors::worker(store.state(), id).unwrap().state.requested, RequestedStatus::Stopped);

    store.dispatch(Action::WorkersUpdateActualStatus { id, status: ActualStatus::Stopped })?;
    assert_eq!(selectors::worker(store.state(), id).unwrap().state.requested, RequestedStatus::Destroyed);

    store.dispatch(Action::WorkersUpdateActualStatus { id, status: ActualStatus::Destroyed })?;
    assert!(selectors::worker(store.state(), id).is_none(), "worker must be removed once destroyed");
    Ok(())
}

#[test]
fn segment_creation_synthesizes_manifolds() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let (executor_id, instance_id, source_id, sink_id, manifold_id) = bringup_with_source_created(&mut store)?;

    let manifold = selectors::manifold_instance(store.state(), manifold_id).unwrap();
    assert_eq!(manifold.port_name, "frames");
    assert_eq!(manifold.pipeline_instance_id, instance_id);
    assert_eq!(manifold.executor_id, executor_id);
    assert_eq!(manifold.state.requested, RequestedStatus::Created, "manifold creation must be requested");

    let source = selectors::segment_instance(store.state(), source_id).unwrap();
    assert_eq!(source.state.requested, RequestedStatus::Running, "created segment must be asked to run");
    assert!(
        manifold.requested_input_segments.contains_key(&source.segment_address),
        "source egress must feed the manifold",
    );
    let sink = selectors::segment_instance(store.state(), sink_id).unwrap();
    assert!(
        manifold.requested_output_segments.contains_key(&sink.segment_address),
        "sink ingress must be fed by the manifold",
    );
    assert!(*manifold.requested_input_segments.get(&source.segment_address).unwrap(), "same-executor segment must be local");

    // Both segments are kept alive by the manifold.
    let manifold_ref = ResourceRef::new(ResourceKind::ManifoldInstances, manifold_id);
    assert!(source.state.dependees.contains(&manifold_ref), "source must hold a dependee edge to the manifold");
    assert!(sink.state.dependees.contains(&manifold_ref), "sink must hold a dependee edge to the manifold");
    Ok(())
}

#[test]
fn segment_lifecycle_to_removal() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let (_executor_id, _instance_id, source_id, sink_id, manifold_id) = bringup_with_source_created(&mut store)?;

    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: sink_id,
        status: ActualStatus::Created,
    })?;
    store.dispatch(Action::ManifoldInstancesUpdateActualStatus {
        id: manifold_id,
        status: ActualStatus::Created,
    })?;
    assert_eq!(
        selectors::manifold_instance(store.state(), manifold_id).unwrap().state.requested,
        RequestedStatus::Running,
    );
    for id in [source_id, sink_id] {
        store.dispatch(Action::SegmentInstancesUpdateActualStatus { id, status: ActualStatus::Running })?;
    }

    // Completion detaches the source, which releases it to stop.
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Completed,
    })?;
    let source = selectors::segment_instance(store.state(), source_id).unwrap();
    assert_eq!(source.state.requested, RequestedStatus::Stopped, "completed segment must be released to stop");
    assert!(source.state.dependees.is_empty(), "detach must release every dependee edge");
    let manifold = selectors::manifold_instance(store.state(), manifold_id).unwrap();
    assert!(
        !manifold.requested_input_segments.contains_key(&source.segment_address),
        "detached source must leave the input map",
    );

    // Stop and destroy reports walk the segment out of the store.
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Stopped,
    })?;
    assert_eq!(
        selectors::segment_instance(store.state(), source_id).unwrap().state.requested,
        RequestedStatus::Destroyed,
    );
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Destroyed,
    })?;
    assert!(selectors::segment_instance(store.state(), source_id).is_none(), "destroyed segment must be removed");

    // Once the sink completes as well, the drained manifold destroys itself.
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: sink_id,
        status: ActualStatus::Completed,
    })?;
    assert!(
        selectors::manifold_instance(store.state(), manifold_id).is_none(),
        "a manifold with no requested segments must be destroyed",
    );
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: sink_id,
        status: ActualStatus::Stopped,
    })?;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: sink_id,
        status: ActualStatus::Destroyed,
    })?;
    assert!(store.state().segment_instances.is_empty(), "all segments must be gone");
    assert!(store.state().manifold_instances.is_empty(), "all manifolds must be gone");
    Ok(())
}

#[test]
fn stop_request_detaches_dependees_before_stopping() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let (_executor_id, _instance_id, source_id, _sink_id, manifold_id) = bringup_with_source_created(&mut store)?;
    let source_address = selectors::segment_instance(store.state(), source_id).unwrap().segment_address;

    store.dispatch(Action::SegmentInstancesRequestStop { id: source_id })?;

    let source = selectors::segment_instance(store.state(), source_id).unwrap();
    assert_eq!(source.state.actual, ActualStatus::Stopping, "stop request must mark the segment stopping");
    assert!(source.state.dependees.is_empty(), "the manifold must have released the segment");
    assert_eq!(source.state.requested, RequestedStatus::Stopped, "an unreferenced stopping segment must be asked to stop");

    let manifold = selectors::manifold_instance(store.state(), manifold_id).unwrap();
    assert!(
        !manifold.requested_input_segments.contains_key(&source_address),
        "stop request must detach the segment from the manifold's requested inputs",
    );
    assert!(
        !manifold.requested_output_segments.is_empty(),
        "the sink must keep the manifold alive",
    );
    Ok(())
}

#[test]
fn stop_request_without_dependees_stops_immediately() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    // No segment has been created yet, so no manifolds exist.
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;

    store.dispatch(Action::SegmentInstancesRequestStop { id: source_id })?;
    let source = selectors::segment_instance(store.state(), source_id).unwrap();
    assert_eq!(source.state.actual, ActualStatus::Stopping);
    assert_eq!(source.state.requested, RequestedStatus::Stopped);
    Ok(())
}
