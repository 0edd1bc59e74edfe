//! In-flight dispatch tracking.
//!
//! # Responsibilities
//! - Count dispatched tasks that have not finished yet
//! - Tag each dispatch with a unique id for tracing
//!
//! Tasks are never awaited or cancelled on shutdown; the count is reported so an
//! operator can see how much work was abandoned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for dispatch ids.
/// Relaxed ordering is enough since we only need uniqueness.
static DISPATCH_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchId(u64);

impl DispatchId {
    pub fn new() -> Self {
        Self(DISPATCH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DispatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Counts dispatched tasks still running.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<AtomicU64>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new dispatch. The returned guard decrements on drop, including on panic unwind.
    pub fn track(&self) -> DispatchGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        DispatchGuard {
            active: Arc::clone(&self.active),
            id: DispatchId::new(),
        }
    }

    /// Dispatches currently running.
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Lifetime of one dispatched message.
#[derive(Debug)]
pub struct DispatchGuard {
    active: Arc<AtomicU64>,
    id: DispatchId,
}

impl DispatchGuard {
    pub fn id(&self) -> DispatchId {
        self.id
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(dispatch_id = %self.id, "Dispatch finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_ids_are_unique() {
        assert_ne!(DispatchId::new(), DispatchId::new());
    }

    #[test]
    fn in_flight_counts() {
        let in_flight = InFlight::new();
        assert_eq!(in_flight.active_count(), 0);

        let a = in_flight.track();
        let b = in_flight.clone().track();
        assert_eq!(in_flight.active_count(), 2);
        assert_ne!(a.id(), b.id());

        drop(a);
        assert_eq!(in_flight.active_count(), 1);
        drop(b);
        assert_eq!(in_flight.active_count(), 0);
    }
}
