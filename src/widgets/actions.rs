//! Intents collected from panel widgets during a frame.
//!
//! Panels only read the scene; what the user asked for is queued here and
//! applied by the app after drawing, so a panel never mutates the store
//! mid-layout.

use crate::core::event_bus::{BoxedEvent, Event};

#[derive(Default)]
pub struct ActionQueue {
    pub events: Vec<BoxedEvent>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send<E: Event>(&mut self, event: E) {
        self.events.push(Box::new(event));
    }

    /// Append another panel's intents, keeping order.
    pub fn merge(&mut self, other: ActionQueue) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
