//! Reader and card condition flags

use std::fmt;

bitflags::bitflags! {
    /// Condition of a reader and the card in it, as reported by the resource manager
    ///
    /// The upper 16 bits carry the reader's event counter. They are kept
    /// intact so a baseline handed back to the resource manager matches the
    /// state it last reported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConditionBits: u32 {
        /// The caller wants the reader ignored
        const IGNORE = 0x0000_0001;
        /// The state differs from the submitted current state
        const CHANGED = 0x0000_0002;
        /// The reader name is not recognized
        const UNKNOWN = 0x0000_0004;
        /// The reader state could not be determined
        const UNAVAILABLE = 0x0000_0008;
        /// No card in the reader
        const EMPTY = 0x0000_0010;
        /// A card is in the reader
        const PRESENT = 0x0000_0020;
        /// The card ATR matches a requested one
        const ATR_MATCH = 0x0000_0040;
        /// The card is held exclusively by another application
        const EXCLUSIVE = 0x0000_0080;
        /// The card is in use by one or more applications
        const IN_USE = 0x0000_0100;
        /// The card does not answer to reset
        const MUTE = 0x0000_0200;
        /// The card is not powered
        const UNPOWERED = 0x0000_0400;

        const _ = !0;
    }
}

impl ConditionBits {
    /// No known state; the resource manager reports the current one immediately
    pub const UNAWARE: Self = Self::empty();

    const EVENT_COUNT_SHIFT: u32 = 16;
    const FLAG_MASK: u32 = 0x0000_FFFF;

    /// Event counter carried in the upper half
    pub const fn event_count(&self) -> u16 {
        (self.bits() >> Self::EVENT_COUNT_SHIFT) as u16
    }

    /// The condition flags without the event counter
    pub const fn flags(&self) -> Self {
        Self::from_bits_retain(self.bits() & Self::FLAG_MASK)
    }

    /// Combine condition flags with an event counter
    pub const fn with_event_count(self, count: u16) -> Self {
        Self::from_bits_retain(
            (self.bits() & Self::FLAG_MASK) | ((count as u32) << Self::EVENT_COUNT_SHIFT),
        )
    }

    /// Whether no flag and no counter is set
    pub const fn is_unaware(&self) -> bool {
        self.bits() == 0
    }
}

impl fmt::Display for ConditionBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags().is_empty() {
            return f.write_str("UNAWARE");
        }
        bitflags::parser::to_writer(&self.flags(), f)
    }
}
