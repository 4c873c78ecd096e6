//! Region events
//!
//! Observers crossing region and manager boundaries raise events. They are
//! queued in the world and either dispatched to registered handlers or
//! drained by the host.
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Handlers only see the event types they registered for

use std::collections::HashMap;

use crate::foundation::collections::ObserverKey;
use crate::regions::RegionId;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionEventType {
    /// Observer entered a region
    RegionEntered,
    /// Observer left a region
    RegionExited,
    /// Observer entered a manager's bounds
    ManagerEntered,
    /// Observer left a manager's bounds
    ManagerExited,
}

/// Index of a manager inside a region world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(pub usize);

/// Boundary crossing of one observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEvent {
    /// Type of event
    pub event_type: RegionEventType,
    /// Observer that crossed the boundary
    pub observer: ObserverKey,
    /// Manager the boundary belongs to
    pub manager: ManagerId,
    /// Region involved; for manager events, the region known at the time
    pub region: Option<RegionId>,
}

impl RegionEvent {
    /// Create a new event
    pub fn new(
        event_type: RegionEventType,
        observer: ObserverKey,
        manager: ManagerId,
        region: Option<RegionId>,
    ) -> Self {
        Self {
            event_type,
            observer,
            manager,
            region,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
pub trait RegionEventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &RegionEvent) -> bool;
}

/// Event queue with handler registration
#[derive(Default)]
pub struct RegionEvents {
    queue: Vec<RegionEvent>,
    handlers: HashMap<RegionEventType, Vec<Box<dyn RegionEventHandler>>>,
}

impl std::fmt::Debug for RegionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionEvents")
            .field("queue", &self.queue)
            .field("handlers", &self.handlers.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl RegionEvents {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific event type
    pub fn register_handler(&mut self, event_type: RegionEventType, handler: Box<dyn RegionEventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event
    pub fn send(&mut self, event: RegionEvent) {
        self.queue.push(event);
    }

    /// Events waiting to be dispatched or drained
    pub fn pending(&self) -> &[RegionEvent] {
        &self.queue
    }

    /// Take every queued event without dispatching
    pub fn drain(&mut self) -> Vec<RegionEvent> {
        std::mem::take(&mut self.queue)
    }

    /// Deliver queued events to their handlers in order
    ///
    /// Stops forwarding an event at the first handler that consumes it.
    pub fn dispatch(&mut self) {
        for event in std::mem::take(&mut self.queue) {
            if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
                for handler in handlers.iter_mut() {
                    if handler.on_event(&event) {
                        break;
                    }
                }
            }
        }
    }

    /// Clear all queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
