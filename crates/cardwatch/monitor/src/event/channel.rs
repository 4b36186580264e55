//! Channel-based event handling

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::event::MonitorEvent;

/// Sender for monitor events
pub type EventSender = Sender<MonitorEvent>;
/// Receiver for monitor events
pub type EventReceiver = Receiver<MonitorEvent>;

/// Create an unbounded channel for monitor events
pub fn event_channel() -> (EventSender, EventReceiver) {
    unbounded()
}

/// Create a bounded channel with the specified capacity for monitor events
///
/// A full channel blocks the poll thread until the consumer catches up.
pub fn bounded_event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    bounded(capacity)
}
