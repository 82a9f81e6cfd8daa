//! Single-byte commands exchanged between the nodes.
//!
//! | Command               | Byte   | Direction      |
//! |-----------------------|--------|----------------|
//! | `SendPassword`        | `0x01` | either         |
//! | `ConfirmSendPassword` | `0x02` | either         |
//! | `OpenDoor`            | `0x03` | HMI -> Control |
//! | `ChangePassword`      | `0x04` | HMI -> Control |
//! | `Unmatched`           | `0xFD` | Control -> HMI |
//! | `Matched`             | `0xFE` | Control -> HMI |
//! | `Ready`               | `0xFF` | either         |

use std::fmt;

use crate::errors::ProtocolError;

/// A command byte on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// "I am about to send a password (or a verdict)."
    SendPassword = 0x01,
    /// "Go ahead, I am ready to receive."
    ConfirmSendPassword = 0x02,
    /// Requested follow-up action is opening the door.
    OpenDoor = 0x03,
    /// Requested follow-up action is changing the credential.
    ChangePassword = 0x04,
    /// Verification failed.
    Unmatched = 0xFD,
    /// Verification succeeded.
    Matched = 0xFE,
    /// Node finished local initialization.
    Ready = 0xFF,
}

impl Command {
    /// Wire byte for this command.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parse a command byte, `None` for anything else (including digits).
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::SendPassword),
            0x02 => Some(Self::ConfirmSendPassword),
            0x03 => Some(Self::OpenDoor),
            0x04 => Some(Self::ChangePassword),
            0xFD => Some(Self::Unmatched),
            0xFE => Some(Self::Matched),
            0xFF => Some(Self::Ready),
            _ => None,
        }
    }

    /// Check whether `byte` is this command.
    pub const fn matches(self, byte: u8) -> bool {
        byte == self as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(ProtocolError::UnknownCommand(byte))
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.to_byte()
    }
}

/// Outcome of a password comparison performed by the Control node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Passwords are identical.
    Matched,
    /// Passwords differ (or the stored credential is unusable).
    Unmatched,
}

impl Verdict {
    /// Verdict for a comparison result.
    pub const fn from_match(matched: bool) -> Self {
        if matched { Self::Matched } else { Self::Unmatched }
    }

    /// Command that carries this verdict on the wire.
    pub const fn command(self) -> Command {
        match self {
            Self::Matched => Command::Matched,
            Self::Unmatched => Command::Unmatched,
        }
    }

    /// Parse a verdict byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match Command::from_byte(byte) {
            Some(Command::Matched) => Some(Self::Matched),
            Some(Command::Unmatched) => Some(Self::Unmatched),
            _ => None,
        }
    }

    /// True for [`Verdict::Matched`].
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Matched)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => f.write_str("matched"),
            Self::Unmatched => f.write_str("unmatched"),
        }
    }
}

/// Follow-up action the HMI requests after a re-verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorAction {
    /// Run the actuator timeline.
    OpenDoor,
    /// Replace the stored credential.
    ChangePassword,
}

impl DoorAction {
    /// Command that carries this action on the wire.
    pub const fn command(self) -> Command {
        match self {
            Self::OpenDoor => Command::OpenDoor,
            Self::ChangePassword => Command::ChangePassword,
        }
    }

    /// Parse an action byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match Command::from_byte(byte) {
            Some(Command::OpenDoor) => Some(Self::OpenDoor),
            Some(Command::ChangePassword) => Some(Self::ChangePassword),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::TERMINATOR;

    const ALL: [Command; 7] = [
        Command::SendPassword,
        Command::ConfirmSendPassword,
        Command::OpenDoor,
        Command::ChangePassword,
        Command::Unmatched,
        Command::Matched,
        Command::Ready,
    ];

    #[test]
    fn command_bytes_are_distinct() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.to_byte(), b.to_byte(), "{a:?} and {b:?} share a byte");
            }
        }
    }

    #[test]
    fn command_bytes_disjoint_from_payload() {
        for command in ALL {
            let byte = command.to_byte();
            assert!(!byte.is_ascii_digit(), "{command:?} collides with a digit");
            assert_ne!(byte, TERMINATOR, "{command:?} collides with the terminator");
        }
    }

    #[test]
    fn digits_are_not_commands() {
        for byte in b'0'..=b'9' {
            assert_eq!(Command::from_byte(byte), None);
            assert_eq!(Command::try_from(byte), Err(ProtocolError::UnknownCommand(byte)));
        }
    }

    #[test]
    fn verdict_only_accepts_verdict_bytes() {
        assert_eq!(Verdict::from_byte(0xFE), Some(Verdict::Matched));
        assert_eq!(Verdict::from_byte(0xFD), Some(Verdict::Unmatched));
        assert_eq!(Verdict::from_byte(Command::OpenDoor.to_byte()), None);
        assert_eq!(Verdict::from_byte(Command::Ready.to_byte()), None);
    }

    #[test]
    fn action_only_accepts_action_bytes() {
        assert_eq!(DoorAction::from_byte(0x03), Some(DoorAction::OpenDoor));
        assert_eq!(DoorAction::from_byte(0x04), Some(DoorAction::ChangePassword));
        assert_eq!(DoorAction::from_byte(Command::Matched.to_byte()), None);
    }
}
