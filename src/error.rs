//! Weft error abstractions.

use thiserror::Error;

use crate::grpc;
use crate::models::{ActualStatus, RequestedStatus, ResourceKind};

/// Application error variants, mirrored on the wire as `ErrorStatus` codes.
#[derive(Debug, Error)]
pub enum AppError {
    /// The referenced resource id does not exist.
    #[error("{kind} resource {id} not found")]
    NotFound { kind: ResourceKind, id: u64 },
    /// A lifecycle transition would violate monotonicity or a destroy precondition.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// The given input was invalid.
    #[error("validation error: {0}")]
    InvalidArgument(String),
    /// The message type or payload could not be understood.
    #[error("unknown message: {0}")]
    Unknown(String),
    /// The server has hit an internal error, but will remain online.
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Format a monotonicity violation for a requested-status update.
    pub fn requested_regression(kind: ResourceKind, id: u64, current: RequestedStatus, new: RequestedStatus) -> Self {
        Self::InvalidTransition(format!("{}/{} requested status may not move back from {:?} to {:?}", kind, id, current, new))
    }

    /// Format a monotonicity violation for an actual-status update.
    pub fn actual_regression(kind: ResourceKind, id: u64, current: ActualStatus, new: ActualStatus) -> Self {
        Self::InvalidTransition(format!("{}/{} actual status may not move back from {:?} to {:?}", kind, id, current, new))
    }

    /// The wire error code for this error.
    pub fn code(&self) -> grpc::ErrorCode {
        match self {
            Self::NotFound { .. } => grpc::ErrorCode::NotFound,
            Self::InvalidTransition(_) => grpc::ErrorCode::InvalidTransition,
            Self::InvalidArgument(_) => grpc::ErrorCode::InvalidArgument,
            Self::Unknown(_) => grpc::ErrorCode::Unknown,
            Self::Internal(_) => grpc::ErrorCode::Internal,
        }
    }

    /// The wire `ErrorStatus` payload for this error.
    pub fn into_error_status(self) -> grpc::ErrorStatus {
        grpc::ErrorStatus {
            code: self.code() as i32,
            message: self.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => Self::Internal(err),
        }
    }
}

/// The error type used to indicate that a system shutdown is required.
#[derive(Debug, Error)]
#[error("fatal error: {0}")]
pub struct ShutdownError(#[from] pub anyhow::Error);

/// A result type used with the gRPC system.
pub type RpcResult<T> = ::std::result::Result<T, tonic::Status>;
