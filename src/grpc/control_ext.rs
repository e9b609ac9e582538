//! Hand-rolled extensions over the generated wire types.

use prost::Message;

use crate::error::AppError;
use crate::grpc::control::*;
use crate::models;

/// The prefix used for all payload type URLs.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com";

/// A message with a registered fully-qualified type name, packable as `Any`.
pub trait TypedMessage: Message + Default {
    /// The fully-qualified protobuf name of this message.
    const TYPE_NAME: &'static str;

    /// The type URL used on the wire for this message.
    fn type_url() -> String {
        format!("{}/{}", TYPE_URL_PREFIX, Self::TYPE_NAME)
    }
}

macro_rules! typed_message {
    ($ty:ty, $name:literal) => {
        impl TypedMessage for $ty {
            const TYPE_NAME: &'static str = $name;
        }
    };
}

typed_message!(Ack, "weft.control.Ack");
typed_message!(PingRequest, "weft.control.PingRequest");
typed_message!(PingResponse, "weft.control.PingResponse");
typed_message!(ShutdownRequest, "weft.control.ShutdownRequest");
typed_message!(ShutdownResponse, "weft.control.ShutdownResponse");
typed_message!(StreamConnected, "weft.control.StreamConnected");
typed_message!(RegisterWorkersRequest, "weft.control.RegisterWorkersRequest");
typed_message!(RegisterWorkersResponse, "weft.control.RegisterWorkersResponse");
typed_message!(DropWorkerRequest, "weft.control.DropWorkerRequest");
typed_message!(PipelineConfiguration, "weft.control.PipelineConfiguration");
typed_message!(PipelineRegisterConfigRequest, "weft.control.PipelineRegisterConfigRequest");
typed_message!(PipelineRegisterConfigResponse, "weft.control.PipelineRegisterConfigResponse");
typed_message!(PipelineAddMappingRequest, "weft.control.PipelineAddMappingRequest");
typed_message!(PipelineAddMappingResponse, "weft.control.PipelineAddMappingResponse");
typed_message!(ManifoldUpdateActualAssignmentsRequest, "weft.control.ManifoldUpdateActualAssignmentsRequest");
typed_message!(ManifoldUpdateActualAssignmentsResponse, "weft.control.ManifoldUpdateActualAssignmentsResponse");
typed_message!(ResourceUpdateStatusRequest, "weft.control.ResourceUpdateStatusRequest");
typed_message!(ResourceUpdateStatusResponse, "weft.control.ResourceUpdateStatusResponse");
typed_message!(ResourceStopRequest, "weft.control.ResourceStopRequest");
typed_message!(ResourceStopResponse, "weft.control.ResourceStopResponse");
typed_message!(ControlPlaneState, "weft.control.ControlPlaneState");
typed_message!(StateUpdate, "weft.control.StateUpdate");

/// Pack the given message into an `Any` with its registered type URL.
pub fn pack<M: TypedMessage>(msg: &M) -> Result<::prost_types::Any, AppError> {
    let mut value = Vec::with_capacity(msg.encoded_len());
    msg.encode(&mut value)
        .map_err(|err| AppError::Internal(anyhow::Error::from(err).context("error encoding payload")))?;
    Ok(::prost_types::Any { type_url: M::type_url(), value })
}

/// Unpack the given `Any` into the expected message type.
///
/// Fails with `Unknown` when the type URL does not match or the bytes do not
/// decode.
pub fn unpack<M: TypedMessage>(any: &::prost_types::Any) -> Result<M, AppError> {
    if any.type_url != M::type_url() {
        return Err(AppError::Unknown(format!("unexpected payload type '{}', expected '{}'", any.type_url, M::type_url())));
    }
    M::decode(any.value.as_slice()).map_err(|err| AppError::Unknown(format!("error decoding payload '{}': {}", any.type_url, err)))
}

impl Event {
    /// Build a successful `Response` event echoing the given tag.
    pub fn response(tag: impl Into<String>, message: Option<::prost_types::Any>) -> Self {
        Self {
            event: EventType::Response as i32,
            tag: tag.into(),
            message,
            error: None,
        }
    }

    /// Build a failed `Response` event echoing the given tag.
    pub fn error_response(tag: impl Into<String>, error: ErrorStatus) -> Self {
        Self {
            event: EventType::Response as i32,
            tag: tag.into(),
            message: None,
            error: Some(error),
        }
    }

    /// Build a `ServerStateUpdate` broadcast event.
    pub fn state_update(message: ::prost_types::Any) -> Self {
        Self {
            event: EventType::ServerStateUpdate as i32,
            tag: Default::default(),
            message: Some(message),
            error: None,
        }
    }

    /// Build the `ClientEventStreamConnected` handshake event.
    pub fn stream_connected(machine_id: u64) -> Result<Self, AppError> {
        Ok(Self {
            event: EventType::ClientEventStreamConnected as i32,
            tag: Default::default(),
            message: Some(pack(&StreamConnected { machine_id })?),
            error: None,
        })
    }

    /// The decoded event type of this envelope, if known.
    pub fn event_type(&self) -> Option<EventType> {
        EventType::from_i32(self.event)
    }
}

impl From<models::RequestedStatus> for ResourceRequestedStatus {
    fn from(val: models::RequestedStatus) -> Self {
        match val {
            models::RequestedStatus::Initialized => Self::Initialized,
            models::RequestedStatus::Created => Self::Created,
            models::RequestedStatus::Running => Self::Running,
            models::RequestedStatus::Completed => Self::Completed,
            models::RequestedStatus::Stopped => Self::Stopped,
            models::RequestedStatus::Destroyed => Self::Destroyed,
        }
    }
}

impl From<ResourceRequestedStatus> for models::RequestedStatus {
    fn from(val: ResourceRequestedStatus) -> Self {
        match val {
            ResourceRequestedStatus::Initialized => Self::Initialized,
            ResourceRequestedStatus::Created => Self::Created,
            ResourceRequestedStatus::Running => Self::Running,
            ResourceRequestedStatus::Completed => Self::Completed,
            ResourceRequestedStatus::Stopped => Self::Stopped,
            ResourceRequestedStatus::Destroyed => Self::Destroyed,
        }
    }
}

impl From<models::ActualStatus> for ResourceActualStatus {
    fn from(val: models::ActualStatus) -> Self {
        match val {
            models::ActualStatus::Unknown => Self::Unknown,
            models::ActualStatus::Creating => Self::Creating,
            models::ActualStatus::Created => Self::Created,
            models::ActualStatus::Running => Self::Running,
            models::ActualStatus::Completed => Self::Completed,
            models::ActualStatus::Stopping => Self::Stopping,
            models::ActualStatus::Stopped => Self::Stopped,
            models::ActualStatus::Destroying => Self::Destroying,
            models::ActualStatus::Destroyed => Self::Destroyed,
        }
    }
}

impl From<ResourceActualStatus> for models::ActualStatus {
    fn from(val: ResourceActualStatus) -> Self {
        match val {
            ResourceActualStatus::Unknown => Self::Unknown,
            ResourceActualStatus::Creating => Self::Creating,
            ResourceActualStatus::Created => Self::Created,
            ResourceActualStatus::Running => Self::Running,
            ResourceActualStatus::Completed => Self::Completed,
            ResourceActualStatus::Stopping => Self::Stopping,
            ResourceActualStatus::Stopped => Self::Stopped,
            ResourceActualStatus::Destroying => Self::Destroying,
            ResourceActualStatus::Destroyed => Self::Destroyed,
        }
    }
}

impl From<models::ResourceKind> for ResourceKind {
    fn from(val: models::ResourceKind) -> Self {
        match val {
            models::ResourceKind::Connections => Self::Connections,
            models::ResourceKind::Workers => Self::Workers,
            models::ResourceKind::PipelineDefinitions => Self::PipelineDefinitions,
            models::ResourceKind::PipelineInstances => Self::PipelineInstances,
            models::ResourceKind::SegmentInstances => Self::SegmentInstances,
            models::ResourceKind::ManifoldInstances => Self::ManifoldInstances,
        }
    }
}

impl From<models::ResourceRef> for ResourceRef {
    fn from(val: models::ResourceRef) -> Self {
        Self {
            kind: ResourceKind::from(val.kind) as i32,
            id: val.id,
        }
    }
}

impl From<&models::ResourceState> for ResourceState {
    fn from(val: &models::ResourceState) -> Self {
        Self {
            requested_status: ResourceRequestedStatus::from(val.requested) as i32,
            actual_status: ResourceActualStatus::from(val.actual) as i32,
            dependees: val.dependees.iter().copied().map(ResourceRef::from).collect(),
            dependers: val.dependers.iter().copied().map(ResourceRef::from).collect(),
        }
    }
}
