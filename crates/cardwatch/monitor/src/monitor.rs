//! Card monitoring session

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::context::ResourceContext;
use crate::error::MonitorError;
use crate::event::{EventHandler, EventSender, MonitorEvent};
use crate::manager::ResourceManager;
use crate::poll::PollLoop;
use crate::registry;
use crate::slot::ReaderSlot;
use crate::status::StatusCode;

/// Lifecycle of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not started, or started with no readers to monitor
    Idle,
    /// The poll thread is running
    Running,
    /// The poll thread observed a stop request and is winding down
    Cancelling,
    /// The session is over and the context released
    Stopped,
}

/// State shared between the monitor and its poll thread
pub(crate) struct Shared<R: ResourceManager> {
    /// The only context of the session
    pub(crate) context: Mutex<ResourceContext<R>>,
    /// Session state
    state: Mutex<MonitorState>,
}

impl<R: ResourceManager> Shared<R> {
    pub(crate) const fn new(context: ResourceContext<R>) -> Self {
        Self {
            context: Mutex::new(context),
            state: Mutex::new(MonitorState::Idle),
        }
    }

    pub(crate) fn state(&self) -> MonitorState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: MonitorState) {
        *self.state.lock() = state;
    }
}

/// Handle that requests a monitor to stop, usable from any thread
/// including inside an event handler
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation; repeated requests are harmless
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Monitor for card insertion and ejection across a fixed set of readers
///
/// Readers are snapshotted when the monitor starts. Readers attached later
/// are not picked up by a running session.
pub struct CardMonitor<R: ResourceManager> {
    /// Context and state shared with the poll thread
    shared: Arc<Shared<R>>,
    /// Cooperative cancellation flag
    cancelled: Arc<AtomicBool>,
    /// Configuration
    config: MonitorConfig,
    /// Readers being monitored
    readers: Vec<String>,
    /// Poll thread, while running
    worker: Option<JoinHandle<()>>,
}

impl<R: ResourceManager> fmt::Debug for CardMonitor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardMonitor")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("readers", &self.readers)
            .field("cancelled", &self.cancelled.load(Ordering::Relaxed))
            .finish()
    }
}

impl<R: ResourceManager> CardMonitor<R> {
    /// Create an idle monitor; nothing is established until [`Self::start`]
    pub fn new(manager: R, config: MonitorConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(ResourceContext::new(manager))),
            cancelled: Arc::new(AtomicBool::new(false)),
            config,
            readers: Vec::new(),
            worker: None,
        }
    }

    /// Start monitoring, delivering events to `handler` on the poll thread
    ///
    /// Returns the readers being monitored. When the resource manager is
    /// unavailable or no readers are attached the list is empty, no thread
    /// is started and the monitor stays idle.
    pub fn start<H>(&mut self, handler: H) -> Result<&[String], MonitorError>
    where
        H: EventHandler + Send + 'static,
    {
        if self.state() != MonitorState::Idle {
            return Err(MonitorError::AlreadyStarted);
        }

        self.readers = {
            let mut context = self.shared.context.lock();
            match context.establish(self.config.scope) {
                Ok(()) => registry::list_readers(&context),
                Err(_) => Vec::new(),
            }
        };

        if self.readers.is_empty() {
            info!("No readers to monitor");
            return Ok(&self.readers);
        }

        let slots = self.readers.iter().map(ReaderSlot::new).collect();
        let poll = PollLoop::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.cancelled),
            slots,
            handler,
            self.config.wait_timeout,
        );

        self.shared.set_state(MonitorState::Running);
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || poll.run());

        match spawned {
            Ok(worker) => {
                info!(readers = ?self.readers, "Monitoring started");
                self.worker = Some(worker);
                Ok(&self.readers)
            }
            Err(e) => {
                error!(error = %e, "Failed to spawn poll thread");
                self.shared.set_state(MonitorState::Idle);
                Err(MonitorError::Spawn(e))
            }
        }
    }

    /// Start monitoring, sending events to a channel
    pub fn start_channel(&mut self, sender: EventSender) -> Result<&[String], MonitorError> {
        self.start(move |event: MonitorEvent| {
            let _ = sender.send(event);
        })
    }

    /// Readers being monitored
    pub fn readers(&self) -> &[String] {
        &self.readers
    }

    /// Current session state
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// Whether the poll thread is running
    pub fn is_running(&self) -> bool {
        matches!(
            self.state(),
            MonitorState::Running | MonitorState::Cancelling
        )
    }

    /// Last failure recorded while establishing or releasing the context
    ///
    /// Blocks for at most one wait timeout while the poll thread is waiting.
    pub fn last_status(&self) -> Option<StatusCode> {
        self.shared.context.lock().last_status()
    }

    /// Handle for requesting cancellation from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Request the poll thread to stop without waiting for it
    ///
    /// The request is observed before the next wait, so within one wait
    /// timeout.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Stop monitoring and release the context
    ///
    /// Blocks until the poll thread has exited. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.cancel();

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                // Joining from inside the handler would deadlock; the loop
                // releases the context itself on exit
                return;
            }
            if worker.join().is_err() {
                error!("Poll thread panicked");
            }
        }

        self.shared.context.lock().release();
        if self.state() != MonitorState::Stopped {
            self.shared.set_state(MonitorState::Stopped);
            info!("Monitoring stopped");
        }
    }
}

impl<R: ResourceManager> Drop for CardMonitor<R> {
    fn drop(&mut self) {
        self.stop();
    }
}
