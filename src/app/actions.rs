//! Inbound action codes.
//!
//! The numbering matches the state codes exchanged with the display unit,
//! so a code received over that link can be dispatched directly.

/// Actions the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionCode {
    Funeral = 1,
    Mass = 2,
    Stop = 3,
    HeatOn = 4,
    HeatOff = 5,
    ToggleProtection = 9,
    /// Parameter carries the new default heating minutes.
    SetHeatTimer = 11,
    Festival = 15,
}

impl ActionCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Funeral),
            2 => Some(Self::Mass),
            3 => Some(Self::Stop),
            4 => Some(Self::HeatOn),
            5 => Some(Self::HeatOff),
            9 => Some(Self::ToggleProtection),
            11 => Some(Self::SetHeatTimer),
            15 => Some(Self::Festival),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}
