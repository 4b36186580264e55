//! Interface to the resource manager
//!
//! The monitoring engine only ever talks to the native API through
//! [`ResourceManager`]. The PC/SC implementation is `PcscManager`;
//! tests plug in scripted implementations.

use std::fmt;
use std::time::Duration;

use crate::slot::ReaderSlot;
use crate::status::StatusCode;

/// Scope of a resource manager context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Operations are performed within the domain of the user
    User,
    /// Operations are performed within the domain of the system
    #[default]
    System,
}

/// Native operations the monitoring engine depends on
pub trait ResourceManager: Send + Sync + 'static {
    /// Opaque context handle
    type Handle: Send + fmt::Debug;

    /// Open a context with the resource manager
    fn establish_context(&self, scope: Scope) -> Result<Self::Handle, StatusCode>;

    /// Release a context
    fn release_context(&self, handle: Self::Handle) -> Result<(), StatusCode>;

    /// List attached readers as a null-delimited multi-string
    ///
    /// With no buffer, returns the number of bytes required. With a buffer,
    /// fills it and returns the number of bytes written.
    fn list_readers(
        &self,
        handle: &Self::Handle,
        buffer: Option<&mut [u8]>,
    ) -> Result<usize, StatusCode>;

    /// Block until the state of any slot differs from its current state, or
    /// until `timeout` elapses
    ///
    /// Updates the event state and ATR of every slot in place.
    fn get_status_change(
        &self,
        handle: &Self::Handle,
        timeout: Duration,
        slots: &mut [ReaderSlot],
    ) -> Result<(), StatusCode>;
}
