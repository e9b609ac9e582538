use anyhow::Result;

use crate::fixtures;
use crate::models::ActualStatus;
use crate::pipeline::manifolds;
use crate::store::{selectors, Action};

#[test]
fn desired_attachments_span_the_fleet_with_locality() -> Result<()> {
    let mut store = fixtures::store_with_watchers();

    // Two executors, each with its own instance of the same definition.
    let exec_a = fixtures::connect_executor(&mut store)?;
    let workers_a = fixtures::register_workers(&mut store, exec_a, 1)?;
    let (_def, _instance_a, segments_a) = fixtures::bringup_linear_pipeline(&mut store, exec_a, &workers_a)?;

    let exec_b = fixtures::connect_executor(&mut store)?;
    let workers_b = fixtures::register_workers(&mut store, exec_b, 1)?;
    let (_def, _instance_b, segments_b) = fixtures::bringup_linear_pipeline(&mut store, exec_b, &workers_b)?;

    // Create segment A/source; synthesis creates the manifold in A's instance
    // and attaches every live segment fleet-wide.
    let source_a = segments_a.iter().find(|(name, _)| name == "source").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_a,
        status: ActualStatus::Created,
    })?;
    let manifold = store.state().manifold_instances.values().next().unwrap().clone();
    assert_eq!(manifold.executor_id, exec_a);

    let desired = manifolds::desired_attachments(store.state(), &manifold);
    let source_a_addr = selectors::segment_instance(store.state(), source_a).unwrap().segment_address;
    let source_b = segments_b.iter().find(|(name, _)| name == "source").unwrap().1;
    let source_b_addr = selectors::segment_instance(store.state(), source_b).unwrap().segment_address;

    assert_eq!(desired.inputs.get(&source_a_addr), Some(&true), "A's source is local to A's manifold");
    assert_eq!(desired.inputs.get(&source_b_addr), Some(&false), "B's source is remote to A's manifold");
    assert_eq!(desired.inputs.len(), 2, "both sources must feed the port");
    assert_eq!(desired.outputs.len(), 2, "both sinks must be fed by the port");
    Ok(())
}

#[test]
fn desired_attachments_exclude_winding_down_segments() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;
    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    let manifold = store.state().manifold_instances.values().next().unwrap().clone();

    store.dispatch(Action::SegmentInstancesRequestStop { id: source_id })?;
    let desired = manifolds::desired_attachments(store.state(), &manifold);
    let source_addr = selectors::segment_instance(store.state(), source_id).unwrap().segment_address;
    assert!(!desired.inputs.contains_key(&source_addr), "a stopping segment is not attachable");
    assert_eq!(desired.outputs.len(), 1, "the live sink remains attachable");
    Ok(())
}

#[test]
fn repeated_segment_creation_reuses_the_manifold() -> Result<()> {
    let mut store = fixtures::store_with_watchers();
    let executor_id = fixtures::connect_executor(&mut store)?;
    let worker_ids = fixtures::register_workers(&mut store, executor_id, 1)?;
    let (_def, _instance, segments) = fixtures::bringup_linear_pipeline(&mut store, executor_id, &worker_ids)?;

    let source_id = segments.iter().find(|(name, _)| name == "source").unwrap().1;
    let sink_id = segments.iter().find(|(name, _)| name == "sink").unwrap().1;
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: source_id,
        status: ActualStatus::Created,
    })?;
    assert_eq!(store.state().manifold_instances.len(), 1);

    // The sink shares the port; its synthesis must reuse the manifold.
    store.dispatch(Action::SegmentInstancesUpdateActualStatus {
        id: sink_id,
        status: ActualStatus::Created,
    })?;
    assert_eq!(store.state().manifold_instances.len(), 1, "synthesis must not duplicate manifolds");
    Ok(())
}
