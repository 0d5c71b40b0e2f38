use crate::RequestId;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// One in-flight request.
#[derive(Debug, Clone)]
pub struct ActiveRequest {
    pub tool: String,
    pub token: CancellationToken,
    pub started_at: DateTime<Utc>,
}

/// In-flight requests of a session, keyed by id.
///
/// Entries are removed when their [`ActiveRequestGuard`] drops, on every
/// completion path. An id can be in flight only once at a time.
#[derive(Debug, Default)]
pub struct ActiveRequestRegistry {
    entries: Mutex<HashMap<RequestId, Slot>>,
    next_ticket: AtomicU64,
}

/// Ticket tells a guard whether the entry under its id is still its own.
#[derive(Debug)]
struct Slot {
    ticket: u64,
    request: ActiveRequest,
}

impl ActiveRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a request whose token is a child of `parent`.
    ///
    /// Returns `None` when `id` is already in flight; the existing entry is
    /// left untouched.
    pub fn register(
        &self,
        id: RequestId,
        tool: &str,
        parent: &CancellationToken,
    ) -> Option<ActiveRequestGuard<'_>> {
        let mut entries = self.entries();
        let Entry::Vacant(vacant) = entries.entry(id) else {
            return None;
        };

        let token = parent.child_token();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        vacant.insert(Slot {
            ticket,
            request: ActiveRequest {
                tool: tool.to_string(),
                token: token.clone(),
                started_at: Utc::now(),
            },
        });

        Some(ActiveRequestGuard {
            registry: self,
            id,
            ticket,
            token,
        })
    }

    pub fn get(&self, id: RequestId) -> Option<ActiveRequest> {
        self.entries().get(&id).map(|slot| slot.request.clone())
    }

    /// Cancel one request. Returns false when it is not in flight.
    pub fn cancel(&self, id: RequestId) -> bool {
        match self.entries().remove(&id) {
            Some(slot) => {
                slot.request.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and forget every request. Returns how many were aborted.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<ActiveRequest> =
            self.entries().drain().map(|(_, slot)| slot.request).collect();
        for request in &drained {
            request.token.cancel();
        }
        drained.len()
    }

    pub fn ids(&self) -> Vec<RequestId> {
        self.entries().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn complete(&self, id: RequestId, ticket: u64) {
        let mut entries = self.entries();
        if entries.get(&id).is_some_and(|slot| slot.ticket == ticket) {
            entries.remove(&id);
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<RequestId, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry membership of one request; dropping it completes the request.
#[derive(Debug)]
pub struct ActiveRequestGuard<'a> {
    registry: &'a ActiveRequestRegistry,
    id: RequestId,
    ticket: u64,
    token: CancellationToken,
}

impl ActiveRequestGuard<'_> {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveRequestGuard<'_> {
    fn drop(&mut self) {
        self.registry.complete(self.id, self.ticket);
    }
}
