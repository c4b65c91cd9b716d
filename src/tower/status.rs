//! Composite status bitmask read by the display unit and web layer.

/// Individual status flags.  The discriminant is the bit mask itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusFlag {
    /// A sequence of any kind is playing.
    Sequence = 0x01,
    /// An hour or half-hour chime is playing.
    HourChime = 0x08,
    /// A quarter chime is playing.
    QuarterChime = 0x10,
    /// The heating relay is energised.
    Heating = 0x20,
    /// The network is unavailable.
    NoNetwork = 0x40,
    /// Inside the chime protection window.
    Protection = 0x80,
}

impl StatusFlag {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Bits cleared by `stop()` and on natural end of playback.
pub const SEQUENCE_MASK: u8 =
    StatusFlag::Sequence.mask() | StatusFlag::HourChime.mask() | StatusFlag::QuarterChime.mask();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBits(u8);

impl StatusBits {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn set(&mut self, flag: StatusFlag, on: bool) {
        if on {
            self.0 |= flag.mask();
        } else {
            self.0 &= !flag.mask();
        }
    }

    pub fn contains(self, flag: StatusFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub fn clear_sequence(&mut self) {
        self.0 &= !SEQUENCE_MASK;
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}
