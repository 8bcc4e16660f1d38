//! A waiting ride request.

use serde::Serialize;

use fleet_core::{GeoPoint, RequesterId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requester {
    pub id:      RequesterId,
    pub name:    String,
    /// Where the requester is waiting.
    pub pickup:  GeoPoint,
    /// Where the requester wants to go.
    pub dropoff: GeoPoint,
}

impl Requester {
    pub fn new(id: RequesterId, name: impl Into<String>, pickup: GeoPoint, dropoff: GeoPoint) -> Self {
        Self { id, name: name.into(), pickup, dropoff }
    }
}
