use anyhow::Result;

use crate::error::AppError;
use crate::grpc::{self, EventType, TypedMessage};
use crate::models;

#[test]
fn any_round_trip_preserves_structure() -> Result<()> {
    let req = grpc::RegisterWorkersRequest {
        ucx_worker_addresses: vec!["ucx://a".into(), "ucx://b".into()],
        partition_addresses: vec![],
    };
    let any = grpc::pack(&req)?;
    assert_eq!(any.type_url, "type.googleapis.com/weft.control.RegisterWorkersRequest");
    let decoded: grpc::RegisterWorkersRequest = grpc::unpack(&any)?;
    assert_eq!(req, decoded, "expected round-tripped payload to be structurally equal");
    Ok(())
}

#[test]
fn unpack_rejects_mismatched_type_urls() -> Result<()> {
    let any = grpc::pack(&grpc::PingRequest { tag: "p1".into() })?;
    let res: Result<grpc::PingResponse, AppError> = grpc::unpack(&any);
    let err = res.unwrap_err();
    assert!(matches!(err, AppError::Unknown(_)), "expected Unknown got {:?}", err);
    Ok(())
}

#[test]
fn unpack_rejects_garbage_bytes() {
    let any = ::prost_types::Any {
        type_url: grpc::PingRequest::type_url(),
        value: vec![0xff; 16],
    };
    let res: Result<grpc::PingRequest, AppError> = grpc::unpack(&any);
    assert!(matches!(res.unwrap_err(), AppError::Unknown(_)));
}

#[test]
fn event_constructors_set_types_and_tags() -> Result<()> {
    let event = grpc::Event::response("t-1", None);
    assert_eq!(event.event_type(), Some(EventType::Response));
    assert_eq!(event.tag, "t-1");
    assert!(event.error.is_none());

    let event = grpc::Event::error_response(
        "t-2",
        grpc::ErrorStatus {
            code: grpc::ErrorCode::NotFound as i32,
            message: "gone".into(),
        },
    );
    assert_eq!(event.event_type(), Some(EventType::Response));
    assert_eq!(event.error.as_ref().unwrap().code, grpc::ErrorCode::NotFound as i32);

    let event = grpc::Event::stream_connected(42)?;
    assert_eq!(event.event_type(), Some(EventType::ClientEventStreamConnected));
    let payload: grpc::StreamConnected = grpc::unpack(event.message.as_ref().unwrap())?;
    assert_eq!(payload.machine_id, 42);
    Ok(())
}

#[test]
fn status_conversions_round_trip() {
    for status in [
        models::ActualStatus::Unknown,
        models::ActualStatus::Creating,
        models::ActualStatus::Created,
        models::ActualStatus::Running,
        models::ActualStatus::Completed,
        models::ActualStatus::Stopping,
        models::ActualStatus::Stopped,
        models::ActualStatus::Destroying,
        models::ActualStatus::Destroyed,
    ] {
        let wire = grpc::ResourceActualStatus::from(status);
        assert_eq!(models::ActualStatus::from(wire), status);
    }
    for status in [
        models::RequestedStatus::Initialized,
        models::RequestedStatus::Created,
        models::RequestedStatus::Running,
        models::RequestedStatus::Completed,
        models::RequestedStatus::Stopped,
        models::RequestedStatus::Destroyed,
    ] {
        let wire = grpc::ResourceRequestedStatus::from(status);
        assert_eq!(models::RequestedStatus::from(wire), status);
    }
}

#[test]
fn resource_kind_discriminators_parse() {
    for (kind, s) in [
        (models::ResourceKind::Connections, "Connections"),
        (models::ResourceKind::Workers, "Workers"),
        (models::ResourceKind::PipelineInstances, "PipelineInstances"),
        (models::ResourceKind::SegmentInstances, "SegmentInstances"),
        (models::ResourceKind::ManifoldInstances, "ManifoldInstances"),
    ] {
        assert_eq!(s.parse::<models::ResourceKind>().unwrap(), kind);
        assert_eq!(kind.as_str(), s);
    }
    assert!("Gizmos".parse::<models::ResourceKind>().is_err());
}
