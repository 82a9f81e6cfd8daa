//! Wire vocabulary for the doorlock link.
//!
//! The HMI and Control nodes talk over a point-to-point byte link with no
//! framing, no checksums and no sequence numbers. Everything either side can
//! say is one of a handful of single-byte commands, or a password frame of
//! five ASCII digits followed by `#`.
//!
//! Command bytes are chosen outside the ASCII digit range and distinct from
//! the terminator, so a reader that is waiting for a specific command can
//! discard in-band data without ever mistaking it for control traffic.
//!
//! The persisted credential uses the exact same six bytes as the wire
//! frame; [`CredentialRecord`] is the zero-copy view of that layout.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod errors;
pub mod password;
pub mod record;

pub use command::{Command, DoorAction, Verdict};
pub use errors::{ProtocolError, Result};
pub use password::{PASSWORD_LEN, Password, TERMINATOR, WIRE_LEN};
pub use record::CredentialRecord;
