//! PC/SC implementation of the resource manager interface

use std::ffi::{CStr, CString};
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use pcsc::{Context, ReaderState, State};
use tracing::trace;

use crate::manager::{ResourceManager, Scope};
use crate::slot::ReaderSlot;
use crate::state::ConditionBits;
use crate::status::StatusCode;

/// Longest wait handed to the native call; `u32::MAX` ms means infinite
const MAX_WAIT: Duration = Duration::from_millis(u32::MAX as u64 - 1);

impl From<pcsc::Error> for StatusCode {
    fn from(err: pcsc::Error) -> Self {
        Self::new(err as u32)
    }
}

impl From<Scope> for pcsc::Scope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::User => Self::User,
            Scope::System => Self::System,
        }
    }
}

/// Established PC/SC context
pub struct PcscHandle {
    context: Context,
}

impl fmt::Debug for PcscHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscHandle").finish_non_exhaustive()
    }
}

/// Resource manager backed by the system PC/SC service
#[derive(Default)]
pub struct PcscManager {
    /// Native reader states from the previous wait, one per slot
    states: Mutex<Vec<ReaderState>>,
}

impl fmt::Debug for PcscManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscManager")
            .field("cached_states", &self.states.lock().len())
            .finish()
    }
}

impl PcscManager {
    /// Create a new PC/SC resource manager
    pub fn new() -> Self {
        Self::default()
    }
}

/// Condition bits for a native event state and its event counter
fn event_bits(state: State, count: u32) -> ConditionBits {
    // Only the low 16 bits of the count are carried by the native state
    ConditionBits::from_bits_truncate(state.bits() as u32).with_event_count(count as u16)
}

/// Event state of a native reader state, including its event counter
fn raw_event_state(state: &ReaderState) -> ConditionBits {
    event_bits(state.event_state(), state.event_count() as u32)
}

/// Native flags for condition bits, without the event counter
fn native_state(bits: ConditionBits) -> State {
    State::from_bits_truncate(bits.flags().bits() as _)
}

/// Native reader state for a slot
fn reader_state(slot: &ReaderSlot) -> Result<ReaderState, StatusCode> {
    let name = CString::new(slot.name()).map_err(|_| StatusCode::INVALID_PARAMETER)?;
    Ok(ReaderState::new(name, native_state(slot.current_state())))
}

/// Bytes taken by a multi-string holding `names`, final terminator included
fn multi_string_len<'a>(names: impl Iterator<Item = &'a CStr>) -> usize {
    names.map(|name| name.to_bytes().len() + 1).sum::<usize>() + 1
}

/// Whether a cached native state can be handed back as is
///
/// True when the slot's baseline is exactly what the native state last
/// reported, event counter included.
fn can_sync(cached: &ReaderState, slot: &ReaderSlot) -> bool {
    raw_event_state(cached) == slot.current_state()
}

/// Bring the cached native states in line with the slots before a wait
fn prepare_states(states: &mut Vec<ReaderState>, slots: &[ReaderSlot]) -> Result<(), StatusCode> {
    let same_readers = states.len() == slots.len()
        && states
            .iter()
            .zip(slots)
            .all(|(state, slot)| state.name().to_bytes() == slot.name().as_bytes());
    if !same_readers {
        *states = slots.iter().map(reader_state).collect::<Result<_, _>>()?;
        return Ok(());
    }

    for (state, slot) in states.iter_mut().zip(slots) {
        if can_sync(state, slot) {
            state.sync_current_state();
        } else {
            *state = reader_state(slot)?;
        }
    }
    Ok(())
}

impl ResourceManager for PcscManager {
    type Handle = PcscHandle;

    fn establish_context(&self, scope: Scope) -> Result<Self::Handle, StatusCode> {
        let context = Context::establish(scope.into())?;
        Ok(PcscHandle { context })
    }

    fn release_context(&self, handle: Self::Handle) -> Result<(), StatusCode> {
        self.states.lock().clear();
        handle.context.release().map_err(|(_, err)| err.into())
    }

    fn list_readers(
        &self,
        handle: &Self::Handle,
        buffer: Option<&mut [u8]>,
    ) -> Result<usize, StatusCode> {
        match buffer {
            None => Ok(handle.context.list_readers_len()?),
            Some(buffer) => Ok(multi_string_len(handle.context.list_readers(buffer)?)),
        }
    }

    fn get_status_change(
        &self,
        handle: &Self::Handle,
        timeout: Duration,
        slots: &mut [ReaderSlot],
    ) -> Result<(), StatusCode> {
        let mut states = self.states.lock();
        prepare_states(&mut states, slots)?;

        handle
            .context
            .get_status_change(Some(timeout.min(MAX_WAIT)), &mut states[..])?;

        for (state, slot) in states.iter().zip(slots.iter_mut()) {
            let event_state = raw_event_state(state);
            trace!(reader = slot.name(), %event_state, "Reader state");
            slot.set_event_state(event_state);
            slot.set_atr(state.atr());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, current: ConditionBits) -> ReaderSlot {
        ReaderSlot::new(name).with_current_state(current)
    }

    #[test]
    fn test_handle_is_debug() {
        fn assert_debug<T: fmt::Debug>() {}
        assert_debug::<<PcscManager as ResourceManager>::Handle>();
        assert_eq!(
            format!("{:?}", PcscManager::new()),
            "PcscManager { cached_states: 0 }"
        );
    }

    #[test]
    fn test_event_bits_carry_counter() {
        let bits = event_bits(State::CHANGED | State::PRESENT, 3);
        assert!(bits.contains(ConditionBits::CHANGED | ConditionBits::PRESENT));
        assert_eq!(bits.event_count(), 3);
        assert_eq!(bits.bits() >> 16, 3);

        // Counters past 16 bits wrap
        assert_eq!(event_bits(State::EMPTY, 0x1_0002).event_count(), 2);
    }

    #[test]
    fn test_native_state_drops_counter() {
        let bits = (ConditionBits::PRESENT | ConditionBits::IN_USE).with_event_count(7);
        assert_eq!(native_state(bits), State::PRESENT | State::INUSE);
        assert_eq!(native_state(ConditionBits::UNAWARE), State::UNAWARE);
    }

    #[test]
    fn test_reader_state_for_slot() {
        let state = reader_state(&slot("Reader A", ConditionBits::EMPTY)).unwrap();
        assert_eq!(state.name().to_bytes(), b"Reader A");
        assert_eq!(raw_event_state(&state), ConditionBits::UNAWARE);

        assert_eq!(
            reader_state(&ReaderSlot::new("bad\0name")).err(),
            Some(StatusCode::INVALID_PARAMETER)
        );
    }

    #[test]
    fn test_multi_string_len() {
        let names = [c"Reader A", c"B"];
        assert_eq!(multi_string_len(names.into_iter()), 9 + 2 + 1);
        assert_eq!(multi_string_len(std::iter::empty()), 1);
    }

    #[test]
    fn test_sync_only_on_matching_baseline() {
        let cached = reader_state(&ReaderSlot::new("A")).unwrap();
        assert!(can_sync(&cached, &ReaderSlot::new("A")));
        assert!(!can_sync(&cached, &slot("A", ConditionBits::EMPTY)));
        assert!(!can_sync(
            &cached,
            &slot("A", ConditionBits::UNAWARE.with_event_count(1))
        ));
    }

    #[test]
    fn test_prepare_states_follows_slots() {
        let mut states = Vec::new();
        let slots = vec![ReaderSlot::new("A"), ReaderSlot::new("B")];
        prepare_states(&mut states, &slots).unwrap();
        let names: Vec<_> = states.iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, vec![c"A".to_owned(), c"B".to_owned()]);

        // A different reader set replaces the cache
        let slots = vec![slot("C", ConditionBits::EMPTY)];
        prepare_states(&mut states, &slots).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name(), c"C");

        // Same readers, either path keeps the entries in slot order
        prepare_states(&mut states, &slots).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name(), c"C");
    }
}
