//! Poll loop run by the monitor thread

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{Level, debug, info, trace, warn};

use crate::event::{EventHandler, MonitorEvent};
use crate::manager::ResourceManager;
use crate::monitor::{MonitorState, Shared};
use crate::slot::ReaderSlot;
use crate::status::StatusCode;

/// Wait, diff and emit until cancelled or the context becomes unusable
pub(crate) struct PollLoop<R: ResourceManager, H> {
    /// Context and session state shared with the monitor
    shared: Arc<Shared<R>>,
    /// Cooperative cancellation flag
    cancelled: Arc<AtomicBool>,
    /// One slot per monitored reader, fixed for the session
    slots: Vec<ReaderSlot>,
    /// Consumer of the events
    handler: H,
    /// Bound on each wait
    timeout: Duration,
}

impl<R, H> PollLoop<R, H>
where
    R: ResourceManager,
    H: EventHandler,
{
    pub(crate) const fn new(
        shared: Arc<Shared<R>>,
        cancelled: Arc<AtomicBool>,
        slots: Vec<ReaderSlot>,
        handler: H,
        timeout: Duration,
    ) -> Self {
        Self {
            shared,
            cancelled,
            slots,
            handler,
            timeout,
        }
    }

    /// Run the loop to completion, then release the context
    pub(crate) fn run(mut self) {
        let _finish = Finish(Arc::clone(&self.shared));
        info!(
            readers = self.slots.len(),
            timeout = ?self.timeout,
            "Poll loop started"
        );

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                debug!("Cancellation requested");
                self.shared.set_state(MonitorState::Cancelling);
                break;
            }

            // The context lock covers the wait only, never the dispatch
            let result = {
                let context = self.shared.context.lock();
                context.wait_for_change(self.timeout, &mut self.slots)
            };

            match result {
                Ok(()) => self.dispatch(),
                Err(status) if status.condition().is_transient() => {
                    trace!("Wait timed out");
                }
                Err(status) => {
                    log_terminal(status);
                    self.handler.handle_event(MonitorEvent::Stopped { status });
                    break;
                }
            }
        }
    }

    /// Diff every slot and emit its transition, in slot order
    fn dispatch(&mut self) {
        for slot in &mut self.slots {
            if let Some(kind) = slot.diff() {
                debug!(reader = slot.name(), %kind, "Card transition");
                self.handler.handle_event(MonitorEvent::Transition {
                    reader: slot.name().to_string(),
                    kind,
                });
            }
        }
    }
}

/// Releases the context and marks the session stopped when the loop exits,
/// including by a panicking handler
struct Finish<R: ResourceManager>(Arc<Shared<R>>);

impl<R: ResourceManager> Drop for Finish<R> {
    fn drop(&mut self) {
        self.0.context.lock().release();
        self.0.set_state(MonitorState::Stopped);
        info!("Poll loop stopped");
    }
}

fn log_terminal(status: StatusCode) {
    let condition = status.condition();
    let level = status.tracing_level();
    if level == Level::WARN {
        warn!(%status, %condition, "Monitoring stopped");
    } else if level == Level::INFO {
        info!(%status, %condition, "Monitoring stopped");
    } else {
        debug!(%status, %condition, "Monitoring stopped");
    }
}
