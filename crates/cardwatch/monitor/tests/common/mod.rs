//! Common test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use nexum_cardwatch::{ConditionBits, ReaderSlot, ResourceManager, Scope, StatusCode};
use parking_lot::Mutex;

/// Scripted answer to one wait call
#[derive(Debug, Clone)]
pub enum Step {
    /// Block for the full timeout, then report it
    Timeout,
    /// Report these states, one per slot
    Changed(Vec<ConditionBits>),
    /// Fail with this status
    Fail(StatusCode),
}

/// Counters observed by the tests
#[derive(Debug, Default)]
pub struct Probe {
    pub establishes: AtomicUsize,
    pub releases: AtomicUsize,
    pub lists: AtomicUsize,
    pub waits: AtomicUsize,
    pub in_wait: AtomicBool,
    pub release_during_wait: AtomicBool,
}

/// Resource manager that replays a script of wait results
#[derive(Debug, Clone)]
pub struct ScriptedManager {
    readers: Vec<u8>,
    establish_error: Option<StatusCode>,
    steps: Arc<Mutex<VecDeque<Step>>>,
    pub probe: Arc<Probe>,
}

impl ScriptedManager {
    /// Manager reporting these readers
    pub fn new(readers: &[u8]) -> Self {
        Self {
            readers: readers.to_vec(),
            establish_error: None,
            steps: Arc::default(),
            probe: Arc::default(),
        }
    }

    /// Manager whose context cannot be established
    pub fn unavailable() -> Self {
        Self {
            establish_error: Some(StatusCode::NO_SERVICE),
            ..Self::new(b"Reader A\0\0")
        }
    }

    /// Queue wait results
    pub fn script(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.lock().extend(steps);
        self
    }

    pub fn releases(&self) -> usize {
        self.probe.releases.load(Ordering::SeqCst)
    }

    pub fn waits(&self) -> usize {
        self.probe.waits.load(Ordering::SeqCst)
    }
}

impl ResourceManager for ScriptedManager {
    type Handle = u32;

    fn establish_context(&self, scope: Scope) -> Result<Self::Handle, StatusCode> {
        assert_eq!(scope, Scope::System);
        self.probe.establishes.fetch_add(1, Ordering::SeqCst);
        match self.establish_error {
            Some(status) => Err(status),
            None => Ok(1),
        }
    }

    fn release_context(&self, _handle: Self::Handle) -> Result<(), StatusCode> {
        if self.probe.in_wait.load(Ordering::SeqCst) {
            self.probe.release_during_wait.store(true, Ordering::SeqCst);
        }
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_readers(
        &self,
        _handle: &Self::Handle,
        buffer: Option<&mut [u8]>,
    ) -> Result<usize, StatusCode> {
        self.probe.lists.fetch_add(1, Ordering::SeqCst);
        if self.readers.iter().all(|&b| b == 0) {
            return Err(StatusCode::NO_READERS_AVAILABLE);
        }
        match buffer {
            None => Ok(self.readers.len()),
            Some(buffer) => {
                buffer[..self.readers.len()].copy_from_slice(&self.readers);
                Ok(self.readers.len())
            }
        }
    }

    fn get_status_change(
        &self,
        _handle: &Self::Handle,
        timeout: Duration,
        slots: &mut [ReaderSlot],
    ) -> Result<(), StatusCode> {
        self.probe.waits.fetch_add(1, Ordering::SeqCst);
        self.probe.in_wait.store(true, Ordering::SeqCst);

        let step = self.steps.lock().pop_front().unwrap_or(Step::Timeout);
        let result = match step {
            Step::Timeout => {
                thread::sleep(timeout);
                Err(StatusCode::TIMEOUT)
            }
            Step::Changed(states) => {
                for (slot, state) in slots.iter_mut().zip(states) {
                    slot.set_event_state(state);
                }
                Ok(())
            }
            Step::Fail(status) => Err(status),
        };

        self.probe.in_wait.store(false, Ordering::SeqCst);
        result
    }
}
