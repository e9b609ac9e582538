use anyhow::{Context, Result};
use rand::prelude::*;

use crate::grpc::{ManifoldConfiguration, PipelineConfiguration, SegmentConfiguration};
use crate::models::{PipelineMapping, SegmentMapping};
use crate::pipeline;
use crate::store::{Action, Store};
use crate::watchers;

/// Build a store with no watchers registered.
pub fn store_bare() -> Store {
    Store::new(Vec::new())
}

/// Build a store with the full lifecycle watcher set registered.
pub fn store_with_watchers() -> Store {
    Store::new(watchers::all())
}

/// A two-segment pipeline: `source` feeds `sink` over the `frames` port.
pub fn linear_pipeline_config() -> PipelineConfiguration {
    PipelineConfiguration {
        segments: vec![
            SegmentConfiguration {
                name: "source".into(),
                ingress_ports: vec![],
                egress_ports: vec!["frames".into()],
            },
            SegmentConfiguration {
                name: "sink".into(),
                ingress_ports: vec!["frames".into()],
                egress_ports: vec![],
            },
        ],
        manifolds: vec![ManifoldConfiguration { name: "frames".into() }],
    }
}

/// Connect a new executor, returning its id.
pub fn connect_executor(store: &mut Store) -> Result<u64> {
    let id = store.allocate_id();
    let barrier = format!("connect/{}", id);
    store.dispatch(Action::StartRequest { id: barrier.clone() })?;
    store
        .dispatch(Action::ConnectionsAdd {
            id,
            peer_info: format!("127.0.0.1:{}", rand::thread_rng().gen_range(1024..u16::MAX)),
        })
        .context("error adding test executor")?;
    store.dispatch(Action::StopRequest { id: barrier })?;
    Ok(id)
}

/// Register `count` workers for the given executor, returning their ids.
pub fn register_workers(store: &mut Store, executor_id: u64, count: usize) -> Result<Vec<u64>> {
    let workers: Vec<crate::store::actions::NewWorker> = (0..count)
        .map(|_| {
            let id = store.allocate_id();
            crate::store::actions::NewWorker {
                id,
                ucx_address: format!("ucx://10.0.0.{}:7777", rand::thread_rng().gen_range(1..255)),
                partition_address: String::new(),
            }
        })
        .collect();
    let ids: Vec<u64> = workers.iter().map(|worker| worker.id).collect();
    let barrier = format!("register/{}", executor_id);
    store.dispatch(Action::StartRequest { id: barrier.clone() })?;
    store
        .dispatch(Action::WorkersAddMany { executor_id, workers })
        .context("error adding test workers")?;
    store.dispatch(Action::StopRequest { id: barrier })?;
    Ok(ids)
}

/// Register the linear pipeline, map `source` onto the first worker and
/// `sink` onto the last, and instantiate it on the given executor.
///
/// Returns `(definition id, pipeline instance id, [(segment name, id)])`.
pub fn bringup_linear_pipeline(store: &mut Store, executor_id: u64, worker_ids: &[u64]) -> Result<(u64, u64, Vec<(String, u64)>)> {
    let config = linear_pipeline_config();
    let definition = pipeline::build_definition(&config).context("error building test definition")?;
    let definition_id = definition.id;

    let first = *worker_ids.first().context("at least one worker is required")?;
    let last = *worker_ids.last().context("at least one worker is required")?;
    let mut mapping = PipelineMapping {
        executor_id,
        segments: Default::default(),
    };
    mapping.segments.insert(
        "source".into(),
        SegmentMapping {
            segment_name: "source".into(),
            worker_ids: vec![first],
        },
    );
    mapping.segments.insert(
        "sink".into(),
        SegmentMapping {
            segment_name: "sink".into(),
            worker_ids: vec![last],
        },
    );

    let barrier = format!("bringup/{}", executor_id);
    store.dispatch(Action::StartRequest { id: barrier.clone() })?;
    store.dispatch(Action::PipelineDefinitionsCreateOrUpdate { definition })?;
    store.dispatch(Action::PipelineDefinitionsSetMapping {
        definition_id,
        mapping: mapping.clone(),
    })?;
    let pipeline_instance_id = store.allocate_id();
    store.dispatch(Action::PipelineInstancesAdd {
        id: pipeline_instance_id,
        definition_id,
        executor_id,
    })?;
    let mut segments = Vec::new();
    for (name, worker_id) in pipeline::placements(&mapping) {
        let id = store.allocate_id();
        store.dispatch(Action::SegmentInstancesAdd {
            id,
            name: name.clone(),
            pipeline_instance_id,
            worker_id,
        })?;
        segments.push((name, id));
    }
    store.dispatch(Action::StopRequest { id: barrier })?;
    Ok((definition_id, pipeline_instance_id, segments))
}
