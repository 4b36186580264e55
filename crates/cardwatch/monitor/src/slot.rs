//! Per-reader state record and transition classification

use std::fmt;

use tracing::debug;

use crate::state::ConditionBits;

/// Capacity of the ATR buffer kept per slot
pub const MAX_ATR_SIZE: usize = 36;

/// Kind of edge observed on a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// A card was inserted
    Inserted,
    /// The card was ejected
    Ejected,
    /// Any other change (in use, exclusive, mute, unpowered, ...)
    Other,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => f.write_str("inserted"),
            Self::Ejected => f.write_str("ejected"),
            Self::Other => f.write_str("changed"),
        }
    }
}

/// Classify the edge between a baseline and a freshly observed state
///
/// Returns `None` when the observation is not flagged as changed, or when
/// there is no baseline yet. Insertion is checked before ejection.
pub const fn classify_transition(
    previous: ConditionBits,
    observed: ConditionBits,
) -> Option<TransitionKind> {
    if !observed.contains(ConditionBits::CHANGED) {
        return None;
    }

    let kind = if observed.contains(ConditionBits::PRESENT)
        && !previous.contains(ConditionBits::PRESENT)
    {
        TransitionKind::Inserted
    } else if observed.contains(ConditionBits::EMPTY) && !previous.contains(ConditionBits::EMPTY)
    {
        TransitionKind::Ejected
    } else {
        TransitionKind::Other
    };

    // First observation of the reader, nothing to compare against
    if previous.is_unaware() {
        return None;
    }

    Some(kind)
}

/// One monitored reader
#[derive(Clone, PartialEq, Eq)]
pub struct ReaderSlot {
    /// Name of the reader
    name: String,
    /// Last known state, submitted to the next wait
    current_state: ConditionBits,
    /// State reported by the most recent wait
    event_state: ConditionBits,
    /// Number of valid bytes in `atr`
    atr_len: usize,
    /// Answer To Reset of the card, opaque here
    atr: [u8; MAX_ATR_SIZE],
}

impl fmt::Debug for ReaderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSlot")
            .field("name", &self.name)
            .field("current_state", &self.current_state)
            .field("event_state", &self.event_state)
            .field("atr", &self.atr())
            .finish()
    }
}

impl ReaderSlot {
    /// Create a slot with no baseline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_state: ConditionBits::UNAWARE,
            event_state: ConditionBits::UNAWARE,
            atr_len: 0,
            atr: [0; MAX_ATR_SIZE],
        }
    }

    /// Set the baseline state
    pub const fn with_current_state(mut self, state: ConditionBits) -> Self {
        self.current_state = state;
        self
    }

    /// Get the reader name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last known state
    pub const fn current_state(&self) -> ConditionBits {
        self.current_state
    }

    /// State reported by the most recent wait
    pub const fn event_state(&self) -> ConditionBits {
        self.event_state
    }

    /// ATR bytes reported by the most recent wait
    pub fn atr(&self) -> &[u8] {
        &self.atr[..self.atr_len]
    }

    /// Record the state observed by a wait call
    pub const fn set_event_state(&mut self, state: ConditionBits) {
        self.event_state = state;
    }

    /// Record the ATR observed by a wait call, truncated to [`MAX_ATR_SIZE`]
    pub fn set_atr(&mut self, atr: &[u8]) {
        let len = atr.len().min(MAX_ATR_SIZE);
        self.atr[..len].copy_from_slice(&atr[..len]);
        self.atr_len = len;
    }

    /// Classify the last observation and advance the baseline to it
    pub fn diff(&mut self) -> Option<TransitionKind> {
        let previous = self.current_state;
        let kind = classify_transition(previous, self.event_state);

        if self.event_state.contains(ConditionBits::CHANGED) {
            debug!(
                reader = %self.name,
                previous = %previous,
                observed = %self.event_state,
                ?kind,
                "Reader state changed"
            );
        }

        self.current_state = self.event_state;
        kind
    }
}
