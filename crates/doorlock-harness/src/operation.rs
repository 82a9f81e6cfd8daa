//! User-level operations for model-based testing.
//!
//! Operations are generated randomly by proptest or `arbitrary` and applied
//! to a [`World`]. They are coarse on purpose: a random keypad stream almost
//! never forms a full password, so passwords are drawn from a small pool
//! that makes matches and mismatches both likely.

use arbitrary::Arbitrary;
use doorlock_core::hmi::Key;

use crate::{HarnessError, World};

/// Small pool of passwords so collisions are common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum PasswordChoice {
    /// `12345`
    Primary,
    /// `54321`
    Secondary,
    /// `00000`
    Zeros,
}

impl PasswordChoice {
    /// The digits as typed.
    pub const fn digits(self) -> &'static str {
        match self {
            Self::Primary => "12345",
            Self::Secondary => "54321",
            Self::Zeros => "00000",
        }
    }
}

/// Something a user (or the clock) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Type a full password and press `=`.
    Submit(PasswordChoice),
    /// Press `+`.
    OpenDoor,
    /// Press `-`.
    ChangePassword,
    /// Press a single key.
    Press(u8),
    /// Let time pass.
    Wait {
        /// Seconds to wait (taken modulo 80 so lockouts can expire).
        seconds: u8,
    },
}

impl Operation {
    /// Apply to a started world.
    pub fn apply(self, world: &mut World) -> Result<(), HarnessError> {
        match self {
            Self::Submit(choice) => {
                world.type_text(choice.digits())?;
                world.press(Key::Enter)
            },
            Self::OpenDoor => world.press(Key::Open),
            Self::ChangePassword => world.press(Key::Change),
            Self::Press(raw) => world.press(Key::from_char(char::from(raw))),
            Self::Wait { seconds } => world.tick_for(u32::from(seconds % 80)),
        }
    }
}
