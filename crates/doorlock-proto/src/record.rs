//! Persisted credential layout.
//!
//! The record occupies a fixed, contiguous six-byte range in the Control
//! node's EEPROM and holds exactly the bytes of the wire frame. Parsing uses
//! `zerocopy` so the layout is checked at compile time.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    errors::{ProtocolError, Result},
    password::{PASSWORD_LEN, Password, TERMINATOR, WIRE_LEN},
};

/// On-store representation of the single credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CredentialRecord {
    digits: [u8; PASSWORD_LEN],
    terminator: u8,
}

impl CredentialRecord {
    /// Size of the record in bytes.
    pub const SIZE: usize = WIRE_LEN;

    /// First EEPROM offset of the record.
    pub const BASE_ADDRESS: u16 = 0x0311;

    /// Record holding `password`.
    pub const fn from_password(password: &Password) -> Self {
        Self { digits: *password.digits(), terminator: TERMINATOR }
    }

    /// Record from exactly [`Self::SIZE`] raw bytes.
    pub fn from_bytes(raw: [u8; WIRE_LEN]) -> Self {
        zerocopy::transmute!(raw)
    }

    /// View raw bytes read back from the store.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::read_from_bytes(bytes).map_err(|_| ProtocolError::InvalidLength {
            expected: Self::SIZE,
            actual: bytes.len(),
        })
    }

    /// Decode the stored password.
    ///
    /// Fails for a store that was never written (erased bytes) or that holds
    /// anything other than a valid frame.
    pub fn password(&self) -> Result<Password> {
        Password::decode(self.as_bytes())
    }

    /// Raw record bytes, in store order.
    pub fn bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<&Password> for CredentialRecord {
    fn from(password: &Password) -> Self {
        Self::from_password(password)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_bytes_match_wire_frame() {
        let password: Password = "12345".parse().unwrap();
        let record = CredentialRecord::from_password(&password);
        assert_eq!(record.bytes(), password.to_wire().as_ref());
    }

    #[test]
    fn round_trips_through_raw_bytes() {
        let password: Password = "70707".parse().unwrap();
        let raw = CredentialRecord::from(&password).bytes().to_vec();
        let record = CredentialRecord::from_slice(&raw).unwrap();
        assert_eq!(record.password().unwrap(), password);
    }

    #[test]
    fn erased_record_has_no_password() {
        let record = CredentialRecord::from_slice(&[0xFF; CredentialRecord::SIZE]).unwrap();
        assert!(record.password().is_err());
    }

    #[test]
    fn from_bytes_matches_from_slice() {
        let record = CredentialRecord::from_bytes(*b"24680#");
        assert_eq!(record, CredentialRecord::from_slice(b"24680#").unwrap());
        assert_eq!(record.password().unwrap(), "24680".parse::<Password>().unwrap());
    }

    #[test]
    fn short_slice_rejected() {
        let err = CredentialRecord::from_slice(&[b'1'; 3]).unwrap_err();
        assert_eq!(err, ProtocolError::InvalidLength { expected: 6, actual: 3 });
    }
}
