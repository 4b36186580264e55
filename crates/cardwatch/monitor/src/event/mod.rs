//! Events emitted by a running monitor

pub mod callback;
pub use callback::*;

pub mod channel;
pub use channel::*;

use crate::slot::TransitionKind;
use crate::status::StatusCode;

/// Events delivered to the consumer of a monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A reader changed state
    Transition {
        /// Reader name
        reader: String,
        /// Kind of change
        kind: TransitionKind,
    },
    /// Monitoring ended because the resource manager became unusable
    Stopped {
        /// Status that ended the session
        status: StatusCode,
    },
}
