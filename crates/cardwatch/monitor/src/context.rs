//! Owned resource manager context

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::manager::{ResourceManager, Scope};
use crate::slot::ReaderSlot;
use crate::status::StatusCode;

/// Single context handle to the resource manager
///
/// The handle is established on demand and released exactly once, at the
/// latest when the context is dropped. Once released, the context cannot be
/// established again.
pub struct ResourceContext<R: ResourceManager> {
    /// Native interface
    manager: R,
    /// Handle, present while the context is valid
    handle: Option<R::Handle>,
    /// Whether the handle has been released
    released: bool,
    /// Last failure reported by establish or release
    last_status: Option<StatusCode>,
}

impl<R: ResourceManager + fmt::Debug> fmt::Debug for ResourceContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("manager", &self.manager)
            .field("handle", &self.handle)
            .field("released", &self.released)
            .field("last_status", &self.last_status)
            .finish()
    }
}

impl<R: ResourceManager> ResourceContext<R> {
    /// Create an invalid context over a resource manager
    pub const fn new(manager: R) -> Self {
        Self {
            manager,
            handle: None,
            released: false,
            last_status: None,
        }
    }

    /// Establish the context
    ///
    /// Does nothing if the context is already valid.
    pub fn establish(&mut self, scope: Scope) -> Result<(), StatusCode> {
        if self.handle.is_some() {
            return Ok(());
        }
        if self.released {
            return Err(StatusCode::INVALID_HANDLE);
        }

        match self.manager.establish_context(scope) {
            Ok(handle) => {
                debug!(?handle, ?scope, "Established resource manager context");
                self.handle = Some(handle);
                self.last_status = None;
                Ok(())
            }
            Err(status) => {
                warn!(%status, ?scope, "Failed to establish resource manager context");
                self.last_status = Some(status);
                Err(status)
            }
        }
    }

    /// Check if the context holds a live handle
    pub const fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the context
    ///
    /// Only the first call reaches the resource manager. A failed release is
    /// recorded in [`Self::last_status`] and otherwise ignored.
    pub fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.released = true;

        match self.manager.release_context(handle) {
            Ok(()) => info!("Released resource manager context"),
            Err(status) => {
                warn!(%status, "Failed to release resource manager context");
                self.last_status = Some(status);
            }
        }
    }

    /// Last failure reported while establishing or releasing
    pub const fn last_status(&self) -> Option<StatusCode> {
        self.last_status
    }

    /// Query the reader multi-string, see [`ResourceManager::list_readers`]
    pub fn list_readers(&self, buffer: Option<&mut [u8]>) -> Result<usize, StatusCode> {
        let handle = self.handle.as_ref().ok_or(StatusCode::INVALID_HANDLE)?;
        self.manager.list_readers(handle, buffer)
    }

    /// Block until a slot changes or the timeout elapses, see
    /// [`ResourceManager::get_status_change`]
    pub fn wait_for_change(
        &self,
        timeout: Duration,
        slots: &mut [ReaderSlot],
    ) -> Result<(), StatusCode> {
        let handle = self.handle.as_ref().ok_or(StatusCode::INVALID_HANDLE)?;
        self.manager.get_status_change(handle, timeout, slots)
    }
}

impl<R: ResourceManager> Drop for ResourceContext<R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::mock::MockManager;

    #[test]
    fn test_establish_is_idempotent() {
        let manager = MockManager::default();
        let mut context = ResourceContext::new(manager.clone());
        assert!(!context.is_valid());

        context.establish(Scope::System).unwrap();
        context.establish(Scope::System).unwrap();
        assert!(context.is_valid());
        assert_eq!(manager.calls.lock().establish, 1);
        assert_eq!(manager.calls.lock().scope, Some(Scope::System));
    }

    #[test]
    fn test_establish_failure_leaves_invalid() {
        let manager = MockManager {
            establish_error: Some(StatusCode::NO_SERVICE),
            ..Default::default()
        };
        let mut context = ResourceContext::new(manager);

        assert_eq!(context.establish(Scope::System), Err(StatusCode::NO_SERVICE));
        assert!(!context.is_valid());
        assert_eq!(context.last_status(), Some(StatusCode::NO_SERVICE));
    }

    #[test]
    fn test_release_twice() {
        let manager = MockManager::default();
        let mut context = ResourceContext::new(manager.clone());
        context.establish(Scope::System).unwrap();

        context.release();
        context.release();
        assert!(!context.is_valid());
        assert_eq!(manager.calls.lock().release, 1);

        drop(context);
        assert_eq!(manager.calls.lock().release, 1);
    }

    #[test]
    fn test_release_without_establish() {
        let manager = MockManager::default();
        let mut context = ResourceContext::new(manager.clone());
        context.release();
        assert_eq!(manager.calls.lock().release, 0);
    }

    #[test]
    fn test_release_failure_is_recorded() {
        let manager = MockManager {
            release_error: Some(StatusCode::INVALID_HANDLE),
            ..Default::default()
        };
        let mut context = ResourceContext::new(manager);
        context.establish(Scope::System).unwrap();

        context.release();
        assert!(!context.is_valid());
        assert_eq!(context.last_status(), Some(StatusCode::INVALID_HANDLE));
    }

    #[test]
    fn test_no_reestablish_after_release() {
        let manager = MockManager::default();
        let mut context = ResourceContext::new(manager.clone());
        context.establish(Scope::System).unwrap();
        context.release();

        assert_eq!(
            context.establish(Scope::System),
            Err(StatusCode::INVALID_HANDLE)
        );
        assert_eq!(manager.calls.lock().establish, 1);
    }

    #[test]
    fn test_drop_releases() {
        let manager = MockManager::default();
        let mut context = ResourceContext::new(manager.clone());
        context.establish(Scope::User).unwrap();
        drop(context);
        assert_eq!(manager.calls.lock().release, 1);
    }

    #[test]
    fn test_calls_on_invalid_context() {
        let context = ResourceContext::new(MockManager::default());
        assert_eq!(context.list_readers(None), Err(StatusCode::INVALID_HANDLE));
        assert_eq!(
            context.wait_for_change(Duration::ZERO, &mut []),
            Err(StatusCode::INVALID_HANDLE)
        );
    }
}
