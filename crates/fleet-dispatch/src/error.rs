use fleet_core::RequesterId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no vehicle named {0:?}")]
    UnknownVehicle(String),

    #[error("vehicle {0:?} already has a requester")]
    VehicleBusy(String),

    #[error("requester {requester} is already assigned to {vehicle:?}")]
    AlreadyAssigned { requester: RequesterId, vehicle: String },

    /// Neither waiting in the queue nor riding with a vehicle: already
    /// served, or never queued.
    #[error("requester {0} is not waiting for a vehicle")]
    NotQueued(RequesterId),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
