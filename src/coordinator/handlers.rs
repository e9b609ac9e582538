//! Request event handlers (the event dispatcher's routing table).
//!
//! Every handler validates its payload, mutates the store through actions,
//! and returns the buffered response events. Errors surface on the response
//! envelope; only listener failures poison the stream.

use crate::error::AppError;
use crate::grpc::{self, Event, EventType, TypedMessage};
use crate::models::{ActualStatus, ResourceKind};
use crate::pipeline;
use crate::store::actions::NewWorker;
use crate::store::{selectors, Action, DispatchError, Store};

/// A handler failure: plain errors are reported on the response event; fatal
/// errors additionally tear the stream down.
#[derive(Debug)]
pub enum HandlerError {
    App(AppError),
    Fatal(AppError),
}

impl HandlerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn into_app_error(self) -> AppError {
        match self {
            Self::App(err) => err,
            Self::Fatal(err) => err,
        }
    }
}

impl From<AppError> for HandlerError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<DispatchError> for HandlerError {
    fn from(err: DispatchError) -> Self {
        if err.is_listener() {
            Self::Fatal(err.into_app_error())
        } else {
            Self::App(err.into_app_error())
        }
    }
}

type HandlerResult = Result<Vec<Event>, HandlerError>;

/// Route one inbound event to its handler.
pub fn handle_event(store: &mut Store, executor_id: u64, event: &Event) -> HandlerResult {
    let event_type = event
        .event_type()
        .ok_or_else(|| AppError::Unknown(format!("unrecognized event type {}", event.event)))?;
    match event_type {
        EventType::ClientEventPing => ping(event),
        EventType::ClientEventRequestStateUpdate => request_state_update(event),
        EventType::ClientUnaryRegisterWorkers => register_workers(store, executor_id, event),
        EventType::ClientUnaryDropWorker => drop_worker(store, executor_id, event),
        EventType::ClientUnaryPipelineRegisterConfig => pipeline_register_config(store, event),
        EventType::ClientUnaryPipelineAddMapping => pipeline_add_mapping(store, executor_id, event),
        EventType::ClientUnaryManifoldUpdateActualAssignments => manifold_update_actual_assignments(store, event),
        EventType::ClientUnaryResourceUpdateStatus => resource_update_status(store, event),
        EventType::ClientUnaryResourceStopRequest => resource_stop_request(store, event),
        other => Err(HandlerError::App(AppError::Unknown(format!(
            "event type {:?} is not a request the coordinator handles",
            other,
        )))),
    }
}

/// Unpack the typed payload of a request event.
fn payload<M: TypedMessage>(event: &Event) -> Result<M, AppError> {
    let any = event
        .message
        .as_ref()
        .ok_or_else(|| AppError::InvalidArgument("request event carries no payload".into()))?;
    grpc::unpack(any)
}

fn respond<M: TypedMessage>(event: &Event, msg: &M) -> HandlerResult {
    Ok(vec![Event::response(event.tag.clone(), Some(grpc::pack(msg)?))])
}

fn ping(event: &Event) -> HandlerResult {
    let req: grpc::PingRequest = payload(event)?;
    respond(event, &grpc::PingResponse { tag: req.tag })
}

/// The response is an empty `StateUpdate`; the ambient snapshot subscription
/// delivers the actual state.
fn request_state_update(event: &Event) -> HandlerResult {
    respond(event, &grpc::StateUpdate::default())
}

fn register_workers(store: &mut Store, executor_id: u64, event: &Event) -> HandlerResult {
    let req: grpc::RegisterWorkersRequest = payload(event)?;
    if req.ucx_worker_addresses.is_empty() {
        return Err(AppError::InvalidArgument("no worker addresses given to register".into()).into());
    }
    let workers: Vec<NewWorker> = req
        .ucx_worker_addresses
        .iter()
        .enumerate()
        .map(|(idx, ucx_address)| NewWorker {
            id: store.allocate_id(),
            ucx_address: ucx_address.clone(),
            partition_address: req.partition_addresses.get(idx).cloned().unwrap_or_default(),
        })
        .collect();
    let instance_ids: Vec<u64> = workers.iter().map(|worker| worker.id).collect();
    store.dispatch(Action::WorkersAddMany { executor_id, workers })?;
    respond(
        event,
        &grpc::RegisterWorkersResponse {
            machine_id: executor_id,
            instance_ids,
        },
    )
}

fn drop_worker(store: &mut Store, executor_id: u64, event: &Event) -> HandlerResult {
    let req: grpc::DropWorkerRequest = payload(event)?;
    let worker = selectors::worker(store.state(), req.instance_id).ok_or(AppError::NotFound {
        kind: ResourceKind::Workers,
        id: req.instance_id,
    })?;
    if worker.executor_id != executor_id {
        return Err(AppError::InvalidArgument(format!(
            "worker {} belongs to executor {}, not the caller",
            req.instance_id, worker.executor_id,
        ))
        .into());
    }
    // A client-initiated drop is forced: it cascades to the worker's segments
    // without waiting for the destroyed gate.
    store.dispatch(Action::WorkersRemove {
        id: req.instance_id,
        cascade: true,
    })?;
    respond(event, &grpc::Ack {})
}

fn pipeline_register_config(store: &mut Store, event: &Event) -> HandlerResult {
    let req: grpc::PipelineRegisterConfigRequest = payload(event)?;
    let config = req.config.ok_or_else(|| AppError::InvalidArgument("pipeline config is required".into()))?;
    let definition = pipeline::build_definition(&config)?;
    let pipeline_definition_id = definition.id;
    store.dispatch(Action::PipelineDefinitionsCreateOrUpdate { definition })?;
    respond(event, &grpc::PipelineRegisterConfigResponse { pipeline_definition_id })
}

fn pipeline_add_mapping(store: &mut Store, executor_id: u64, event: &Event) -> HandlerResult {
    let req: grpc::PipelineAddMappingRequest = payload(event)?;
    let wire_mapping = req.mapping.ok_or_else(|| AppError::InvalidArgument("pipeline mapping is required".into()))?;
    let mapping = pipeline::mapping_from_wire(executor_id, &wire_mapping)?;

    // Validate the full placement before mutating anything.
    let state = store.state();
    let def = selectors::pipeline_definition(state, req.definition_id).ok_or(AppError::NotFound {
        kind: ResourceKind::PipelineDefinitions,
        id: req.definition_id,
    })?;
    let placements = pipeline::placements(&mapping);
    for (segment_name, worker_id) in &placements {
        if !def.segments.contains_key(segment_name) {
            return Err(AppError::InvalidArgument(format!(
                "mapping names unknown segment '{}' for definition {}",
                segment_name, req.definition_id,
            ))
            .into());
        }
        let worker = selectors::worker(state, *worker_id).ok_or(AppError::NotFound {
            kind: ResourceKind::Workers,
            id: *worker_id,
        })?;
        if worker.executor_id != mapping.executor_id {
            return Err(AppError::InvalidArgument(format!(
                "worker {} belongs to executor {}, not mapped executor {}",
                worker_id, worker.executor_id, mapping.executor_id,
            ))
            .into());
        }
    }

    let target_executor = mapping.executor_id;
    store.dispatch(Action::PipelineDefinitionsSetMapping {
        definition_id: req.definition_id,
        mapping,
    })?;
    let pipeline_instance_id = store.allocate_id();
    store.dispatch(Action::PipelineInstancesAdd {
        id: pipeline_instance_id,
        definition_id: req.definition_id,
        executor_id: target_executor,
    })?;
    for (segment_name, worker_id) in placements {
        let id = store.allocate_id();
        store.dispatch(Action::SegmentInstancesAdd {
            id,
            name: segment_name,
            pipeline_instance_id,
            worker_id,
        })?;
    }
    respond(event, &grpc::PipelineAddMappingResponse { pipeline_instance_id })
}

fn manifold_update_actual_assignments(store: &mut Store, event: &Event) -> HandlerResult {
    let req: grpc::ManifoldUpdateActualAssignmentsRequest = payload(event)?;
    store.dispatch(Action::ManifoldInstancesUpdateActualSegments {
        id: req.manifold_instance_id,
        inputs: req.actual_input_segments.iter().map(|(k, v)| (*k, *v)).collect(),
        outputs: req.actual_output_segments.iter().map(|(k, v)| (*k, *v)).collect(),
    })?;
    respond(event, &grpc::ManifoldUpdateActualAssignmentsResponse { ok: true })
}

fn resource_update_status(store: &mut Store, event: &Event) -> HandlerResult {
    let req: grpc::ResourceUpdateStatusRequest = payload(event)?;
    let kind: ResourceKind = req.resource_type.parse()?;
    if kind == ResourceKind::PipelineDefinitions {
        return Err(AppError::InvalidArgument("pipeline definitions carry no status".into()).into());
    }
    let status = grpc::ResourceActualStatus::from_i32(req.status)
        .ok_or_else(|| AppError::InvalidArgument(format!("unknown actual status value {}", req.status)))?;
    store.dispatch(Action::update_actual(kind, req.resource_id, ActualStatus::from(status)))?;
    respond(event, &grpc::ResourceUpdateStatusResponse { ok: true })
}

fn resource_stop_request(store: &mut Store, event: &Event) -> HandlerResult {
    let req: grpc::ResourceStopRequest = payload(event)?;
    let kind: ResourceKind = req.resource_type.parse()?;
    if kind != ResourceKind::SegmentInstances {
        return Err(AppError::InvalidArgument(format!("{} resources do not support explicit stop requests", kind)).into());
    }
    store.dispatch(Action::SegmentInstancesRequestStop { id: req.resource_id })?;
    respond(event, &grpc::ResourceStopResponse { ok: true })
}
