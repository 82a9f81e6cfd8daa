//! Protocol error types.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding bytes from the link or the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Byte does not name any command.
    #[error("unknown command byte: {0:#04x}")]
    UnknownCommand(u8),

    /// A password position holds something other than an ASCII digit.
    #[error("invalid password symbol {symbol:#04x} at position {position}")]
    InvalidSymbol {
        /// Zero-based position within the password.
        position: usize,
        /// Offending byte.
        symbol: u8,
    },

    /// Frame or record has the wrong number of bytes.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// Last byte of a frame is not the `#` terminator.
    #[error("missing terminator: got {0:#04x}")]
    MissingTerminator(u8),
}
