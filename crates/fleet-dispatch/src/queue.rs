//! FIFO of waiting requesters.

use std::collections::VecDeque;

use fleet_core::{GeoPoint, RequesterId};

use crate::Requester;

/// Requesters waiting for a vehicle, oldest first.
///
/// Also allocates requester ids: ids come from a counter that only grows,
/// so two requesters never share one even after the first leaves the queue.
#[derive(Debug, Default)]
pub struct RequestQueue {
    waiting: VecDeque<Requester>,
    next_id: u32,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Create a requester with a fresh id and enqueue it.  Returns a copy.
    pub fn enqueue_new(&mut self, name: impl Into<String>, pickup: GeoPoint, dropoff: GeoPoint) -> Requester {
        let id = RequesterId(self.next_id);
        self.next_id += 1;
        let requester = Requester::new(id, name, pickup, dropoff);
        self.waiting.push_back(requester.clone());
        requester
    }

    /// The oldest waiting requester, without removing it.
    pub fn peek(&self) -> Option<&Requester> {
        self.waiting.front()
    }

    /// Copies of every waiting requester, oldest first.
    pub fn list(&self) -> Vec<Requester> {
        self.waiting.iter().cloned().collect()
    }

    pub fn contains(&self, id: RequesterId) -> bool {
        self.waiting.iter().any(|r| r.id == id)
    }

    /// Remove the requester with `id`, wherever it is in the queue.
    pub fn remove(&mut self, id: RequesterId) -> Option<Requester> {
        let pos = self.waiting.iter().position(|r| r.id == id)?;
        self.waiting.remove(pos)
    }
}
