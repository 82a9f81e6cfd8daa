//! Three-step handshakes shared by both nodes.
//!
//! Every payload on the link travels the same way:
//!
//! ```text
//! sender                         receiver
//!   │── SEND_PASSWORD ─────────────▶│
//!   │◀──────── CONFIRM_SEND_PASSWORD│
//!   │── payload ───────────────────▶│
//! ```
//!
//! The payload is either a password frame (five digits then `#`) or a single
//! verdict byte. Each side of the handshake is a tiny state machine fed one
//! byte at a time. Bytes that do not fit the expected step are discarded and
//! the side keeps waiting; there is no timeout and no resynchronization.

use bytes::{Bytes, BytesMut};
use doorlock_proto::{Command, Password, TERMINATOR, Verdict, WIRE_LEN};

/// Upper bound on buffered password bytes while waiting for the terminator.
///
/// Bytes beyond this are dropped but the frame still ends at the next `#`,
/// and it then decodes as malformed.
pub const MAX_FRAME_LEN: usize = 32;

/// Bytes a node puts on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// A single protocol code.
    Command(Command),
    /// A password frame, terminator included.
    Password(Password),
}

impl Outbound {
    /// Append the encoded bytes to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Self::Command(command) => dst.extend_from_slice(&[command.to_byte()]),
            Self::Password(password) => password.encode(dst),
        }
    }

    /// Encoded bytes as an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(WIRE_LEN);
        self.encode(&mut buf);
        buf.freeze()
    }
}

impl From<Command> for Outbound {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<Password> for Outbound {
    fn from(password: Password) -> Self {
        Self::Password(password)
    }
}

impl From<Verdict> for Outbound {
    fn from(verdict: Verdict) -> Self {
        Self::Command(verdict.command())
    }
}

/// Check `byte` against the code a waiting node expects.
///
/// Anything else is a discarded byte and is logged at debug.
pub fn expect(expected: Command, byte: u8, waiting_in: &'static str) -> bool {
    if expected.matches(byte) {
        return true;
    }
    tracing::debug!(byte, ?expected, waiting_in, "discarded byte");
    false
}

/// Sender side of the handshake.
///
/// Created with [`Offer::start`], which yields the `SEND_PASSWORD` byte to
/// transmit. Once the peer confirms, [`Offer::on_byte`] hands the payload
/// back for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer<T> {
    payload: Option<T>,
}

impl<T: Copy + Into<Outbound>> Offer<T> {
    /// Begin offering `payload`. The returned code must be sent first.
    pub const fn start(payload: T) -> (Self, Outbound) {
        (Self { payload: Some(payload) }, Outbound::Command(Command::SendPassword))
    }

    /// Payload waiting to be delivered, if any.
    pub const fn pending(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Feed one received byte.
    ///
    /// Returns the payload once `CONFIRM_SEND_PASSWORD` arrives. Every other
    /// byte is discarded. After delivery the offer is spent and keeps
    /// returning `None`.
    pub fn on_byte(&mut self, byte: u8) -> Option<T> {
        if self.payload.is_none() {
            return None;
        }
        if expect(Command::ConfirmSendPassword, byte, "offer") { self.payload.take() } else { None }
    }
}

/// Progress of a receiving handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep<T> {
    /// Keep feeding bytes.
    Pending,
    /// Send this reply and keep feeding bytes.
    Reply(Outbound),
    /// The handshake finished with this payload.
    Complete(T),
}

/// A password frame as received from the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Well-formed five-digit frame.
    Password(Password),
    /// Anything else that ended with `#`.
    Malformed,
}

impl Received {
    /// Compare against a known password. A malformed frame never matches.
    pub fn matches(&self, other: &Password) -> bool {
        match self {
            Self::Password(password) => password == other,
            Self::Malformed => false,
        }
    }

    /// The password, if the frame was well-formed.
    pub const fn password(&self) -> Option<&Password> {
        match self {
            Self::Password(password) => Some(password),
            Self::Malformed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IntakeState {
    AwaitAnnounce,
    Collecting { frame: Vec<u8>, overflowed: bool },
}

/// Receiver side of a password handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordIntake {
    state: IntakeState,
}

impl Default for PasswordIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordIntake {
    /// Intake waiting for `SEND_PASSWORD`.
    pub const fn new() -> Self {
        Self { state: IntakeState::AwaitAnnounce }
    }

    /// True once the announce was confirmed and frame bytes are expected.
    pub const fn is_collecting(&self) -> bool {
        matches!(self.state, IntakeState::Collecting { .. })
    }

    /// Feed one received byte.
    pub fn on_byte(&mut self, byte: u8) -> IntakeStep<Received> {
        match &mut self.state {
            IntakeState::AwaitAnnounce => {
                if !expect(Command::SendPassword, byte, "password intake") {
                    return IntakeStep::Pending;
                }
                self.state = IntakeState::Collecting {
                    frame: Vec::with_capacity(WIRE_LEN),
                    overflowed: false,
                };
                IntakeStep::Reply(Outbound::Command(Command::ConfirmSendPassword))
            },
            IntakeState::Collecting { frame, overflowed } => {
                if frame.len() < MAX_FRAME_LEN {
                    frame.push(byte);
                } else {
                    *overflowed = true;
                }

                if byte != TERMINATOR {
                    return IntakeStep::Pending;
                }

                let received = if *overflowed {
                    Received::Malformed
                } else {
                    match Password::decode(frame) {
                        Ok(password) => Received::Password(password),
                        Err(error) => {
                            tracing::warn!(%error, len = frame.len(), "malformed password frame");
                            Received::Malformed
                        },
                    }
                };
                if *overflowed {
                    tracing::warn!(limit = MAX_FRAME_LEN, "oversized password frame");
                }

                self.state = IntakeState::AwaitAnnounce;
                IntakeStep::Complete(received)
            },
        }
    }
}

/// Receiver side of a verdict handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerdictIntake {
    confirmed: bool,
}

impl VerdictIntake {
    /// Intake waiting for `SEND_PASSWORD`.
    pub const fn new() -> Self {
        Self { confirmed: false }
    }

    /// Feed one received byte. Completes with the raw verdict byte, which
    /// the caller interprets.
    pub fn on_byte(&mut self, byte: u8) -> IntakeStep<u8> {
        if self.confirmed {
            self.confirmed = false;
            return IntakeStep::Complete(byte);
        }
        if expect(Command::SendPassword, byte, "verdict intake") {
            self.confirmed = true;
            IntakeStep::Reply(Outbound::Command(Command::ConfirmSendPassword))
        } else {
            IntakeStep::Pending
        }
    }
}
