//! Callback-based event handling

use crate::event::MonitorEvent;

/// Trait for handling monitor events
///
/// Handlers run on the poll thread. Anything slow should be handed off.
pub trait EventHandler {
    /// Handle a monitor event
    fn handle_event(&mut self, event: MonitorEvent);
}

// Implement handlers for closures
impl<F> EventHandler for F
where
    F: FnMut(MonitorEvent),
{
    fn handle_event(&mut self, event: MonitorEvent) {
        self(event)
    }
}
