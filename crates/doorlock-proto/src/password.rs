//! Five-digit password and its wire frame.
//!
//! A frame is the five ASCII digits followed by [`TERMINATOR`]. The receiver
//! reads until it sees the terminator, so the frame is self-delimiting even
//! though the link itself has no framing.

use std::{fmt, str::FromStr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};

/// Number of digit symbols in a password.
pub const PASSWORD_LEN: usize = 5;

/// Symbol that ends a password frame.
pub const TERMINATOR: u8 = b'#';

/// Bytes in an encoded frame (digits plus terminator).
pub const WIRE_LEN: usize = PASSWORD_LEN + 1;

/// An ordered sequence of exactly five ASCII digits.
///
/// # Security
///
/// The `Debug` impl redacts the digits so that credentials never end up in
/// logs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Password([u8; PASSWORD_LEN]);

impl Password {
    /// Build a password from raw digit bytes.
    pub fn new(digits: [u8; PASSWORD_LEN]) -> Result<Self> {
        if let Some(position) = digits.iter().position(|b| !b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidSymbol { position, symbol: digits[position] });
        }
        Ok(Self(digits))
    }

    /// The digit bytes.
    pub const fn digits(&self) -> &[u8; PASSWORD_LEN] {
        &self.0
    }

    /// Append the wire frame (digits then `#`) to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(WIRE_LEN);
        dst.put_slice(&self.0);
        dst.put_u8(TERMINATOR);
    }

    /// The wire frame as an owned buffer.
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(WIRE_LEN);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a complete frame, terminator included.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() != WIRE_LEN {
            return Err(ProtocolError::InvalidLength { expected: WIRE_LEN, actual: frame.len() });
        }

        let last = frame[PASSWORD_LEN];
        if last != TERMINATOR {
            return Err(ProtocolError::MissingTerminator(last));
        }

        let mut digits = [0u8; PASSWORD_LEN];
        digits.copy_from_slice(&frame[..PASSWORD_LEN]);
        Self::new(digits)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl FromStr for Password {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let digits: [u8; PASSWORD_LEN] = bytes.try_into().map_err(|_| {
            ProtocolError::InvalidLength { expected: PASSWORD_LEN, actual: bytes.len() }
        })?;
        Self::new(digits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hex_literal::hex;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encodes_digits_then_terminator() {
        let password: Password = "12345".parse().unwrap();
        assert_eq!(password.to_wire().as_ref(), &hex!("31 32 33 34 35 23"));
    }

    #[test]
    fn rejects_non_digits() {
        let err = "12a45".parse::<Password>().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidSymbol { position: 2, symbol: b'a' });
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "1234".parse::<Password>().unwrap_err();
        assert_eq!(err, ProtocolError::InvalidLength { expected: 5, actual: 4 });
    }

    #[test]
    fn decode_requires_terminator() {
        let err = Password::decode(b"123456").unwrap_err();
        assert_eq!(err, ProtocolError::MissingTerminator(b'6'));
    }

    #[test]
    fn decode_rejects_erased_storage() {
        let err = Password::decode(&[0xFF; WIRE_LEN]).unwrap_err();
        assert_eq!(err, ProtocolError::MissingTerminator(0xFF));
    }

    #[test]
    fn debug_redacts_digits() {
        let password: Password = "90210".parse().unwrap();
        let rendered = format!("{password:?}");
        assert!(!rendered.contains("90210"));
        assert!(rendered.contains("redacted"));
    }

    proptest! {
        #[test]
        fn equal_iff_digits_equal(a in "[0-9]{5}", b in "[0-9]{5}") {
            let pa: Password = a.parse().unwrap();
            let pb: Password = b.parse().unwrap();
            prop_assert_eq!(pa == pb, a == b);
            prop_assert_eq!(pa.to_wire() == pb.to_wire(), a == b);
        }

        #[test]
        fn decode_accepts_exactly_what_encode_produces(digits in "[0-9]{5}") {
            let password: Password = digits.parse().unwrap();
            prop_assert_eq!(Password::decode(&password.to_wire()).unwrap(), password);
        }
    }
}
