//! Credential vault over a byte-addressable EEPROM.
//!
//! The device only supports single-byte reads and writes, and it needs a
//! settle delay between two consecutive operations. The vault owns both
//! rules: it moves the six-byte [`CredentialRecord`] one byte at a time and
//! never issues an operation before the delay has elapsed since the previous
//! one.

use std::time::Duration;

use doorlock_proto::{CredentialRecord, Password};
use thiserror::Error;

use crate::env::Environment;

/// Errors from the EEPROM backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Offset outside the device.
    #[error("offset {offset:#06x} out of range (capacity {capacity} bytes)")]
    OutOfRange {
        /// Requested offset.
        offset: u16,
        /// Device size in bytes.
        capacity: usize,
    },

    /// Backend failure.
    #[error("eeprom I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte-addressable persistent storage.
pub trait Eeprom: Send + 'static {
    /// Write one byte.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the offset is out of range or the backend
    /// fails.
    fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError>;

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the offset is out of range or the backend
    /// fails.
    fn read(&mut self, offset: u16) -> Result<u8, StoreError>;
}

/// Byte value of an erased cell.
pub const ERASED: u8 = 0xFF;

/// Default device size.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-memory EEPROM, erased on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEeprom {
    cells: Vec<u8>,
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryEeprom {
    /// Erased device of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { cells: vec![ERASED; capacity] }
    }

    /// Raw view of the device contents.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn cell(&mut self, offset: u16) -> Result<&mut u8, StoreError> {
        let capacity = self.cells.len();
        self.cells.get_mut(usize::from(offset)).ok_or(StoreError::OutOfRange { offset, capacity })
    }
}

impl Eeprom for MemoryEeprom {
    fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError> {
        *self.cell(offset)? = byte;
        Ok(())
    }

    fn read(&mut self, offset: u16) -> Result<u8, StoreError> {
        self.cell(offset).map(|cell| *cell)
    }
}

/// Vault placement and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultConfig {
    /// Offset of the first record byte.
    pub base_address: u16,
    /// Minimum gap between two consecutive EEPROM operations.
    pub settle: Duration,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { base_address: CredentialRecord::BASE_ADDRESS, settle: Duration::from_millis(10) }
    }
}

/// Persists the single credential record.
pub struct CredentialVault<R: Eeprom, E: Environment> {
    eeprom: R,
    env: E,
    config: VaultConfig,
    last_op: Option<E::Instant>,
}

impl<R: Eeprom, E: Environment> CredentialVault<R, E> {
    /// Vault with default placement and settle delay.
    pub fn new(eeprom: R, env: E) -> Self {
        Self::with_config(eeprom, env, VaultConfig::default())
    }

    /// Vault with explicit placement and settle delay.
    pub const fn with_config(eeprom: R, env: E, config: VaultConfig) -> Self {
        Self { eeprom, env, config, last_op: None }
    }

    /// The underlying device.
    pub const fn eeprom(&self) -> &R {
        &self.eeprom
    }

    /// Write the password record, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OutOfRange` before touching the device if the
    /// record does not fit in the address space, or `StoreError` if any byte
    /// write fails. Bytes already written stay written; a partial record
    /// decodes as no password.
    pub async fn persist(&mut self, password: &Password) -> Result<(), StoreError> {
        let record = CredentialRecord::from_password(password);
        for (offset, &byte) in self.offsets()?.into_iter().zip(record.bytes()) {
            if let Some(wait) = self.remaining_settle() {
                self.env.sleep(wait).await;
            }
            let result = self.eeprom.write(offset, byte);
            self.last_op = Some(self.env.now());
            result?;
        }
        tracing::debug!(base = self.config.base_address, "credential persisted");
        Ok(())
    }

    /// Read the stored record back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any byte read fails.
    pub async fn load(&mut self) -> Result<CredentialRecord, StoreError> {
        let mut raw = [ERASED; CredentialRecord::SIZE];
        for (offset, slot) in self.offsets()?.into_iter().zip(raw.iter_mut()) {
            if let Some(wait) = self.remaining_settle() {
                self.env.sleep(wait).await;
            }
            let result = self.eeprom.read(offset);
            self.last_op = Some(self.env.now());
            *slot = result?;
        }
        Ok(CredentialRecord::from_bytes(raw))
    }

    /// Device offsets of the record bytes, all of them or none.
    fn offsets(&self) -> Result<[u16; CredentialRecord::SIZE], StoreError> {
        let base = self.config.base_address;
        let mut offsets = [base; CredentialRecord::SIZE];
        for (i, slot) in (0u16..).zip(offsets.iter_mut()) {
            *slot = base.checked_add(i).ok_or(StoreError::OutOfRange {
                offset: base,
                capacity: usize::from(u16::MAX) + 1,
            })?;
        }
        Ok(offsets)
    }

    /// Settle delay still owed since the previous operation.
    fn remaining_settle(&self) -> Option<Duration> {
        let since = self.env.now() - self.last_op?;
        self.config.settle.checked_sub(since).filter(|wait| !wait.is_zero())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::*;

    /// Virtual clock where sleeping advances time instantly.
    #[derive(Clone, Default)]
    struct ManualEnv {
        now: Arc<Mutex<Duration>>,
    }

    impl Environment for ManualEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        #[allow(clippy::manual_async_fn)]
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            let now = Arc::clone(&self.now);
            async move {
                *now.lock().unwrap() += duration;
            }
        }
    }

    /// EEPROM that records when each operation happened.
    struct TimedEeprom {
        inner: MemoryEeprom,
        env: ManualEnv,
        ops: Arc<Mutex<Vec<Duration>>>,
    }

    impl Eeprom for TimedEeprom {
        fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError> {
            self.ops.lock().unwrap().push(self.env.now());
            self.inner.write(offset, byte)
        }

        fn read(&mut self, offset: u16) -> Result<u8, StoreError> {
            self.ops.lock().unwrap().push(self.env.now());
            self.inner.read(offset)
        }
    }

    fn pw(s: &str) -> Password {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn round_trip_identical() {
        let mut vault = CredentialVault::new(MemoryEeprom::default(), ManualEnv::default());

        vault.persist(&pw("12345")).await.unwrap();
        let record = vault.load().await.unwrap();

        assert_eq!(record.password().unwrap(), pw("12345"));
        assert_eq!(&vault.eeprom().cells()[0x0311..=0x0316], b"12345#");
    }

    #[tokio::test]
    async fn overwrite_replaces_record() {
        let mut vault = CredentialVault::new(MemoryEeprom::default(), ManualEnv::default());

        vault.persist(&pw("11111")).await.unwrap();
        vault.persist(&pw("24680")).await.unwrap();

        assert_eq!(vault.load().await.unwrap().password().unwrap(), pw("24680"));
    }

    #[tokio::test]
    async fn erased_store_has_no_password() {
        let mut vault = CredentialVault::new(MemoryEeprom::default(), ManualEnv::default());
        assert!(vault.load().await.unwrap().password().is_err());
    }

    #[tokio::test]
    async fn operations_respect_settle_delay() {
        let env = ManualEnv::default();
        let ops = Arc::new(Mutex::new(Vec::new()));
        let eeprom =
            TimedEeprom { inner: MemoryEeprom::default(), env: env.clone(), ops: Arc::clone(&ops) };
        let mut vault = CredentialVault::new(eeprom, env);

        vault.persist(&pw("12345")).await.unwrap();
        vault.load().await.unwrap();

        let ops = ops.lock().unwrap();
        assert_eq!(ops.len(), 12);
        for pair in ops.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(10), "ops too close: {pair:?}");
        }
    }

    #[tokio::test]
    async fn out_of_range_is_reported() {
        let config = VaultConfig { base_address: 0x03FE, settle: Duration::ZERO };
        let mut vault =
            CredentialVault::with_config(MemoryEeprom::default(), ManualEnv::default(), config);

        let err = vault.persist(&pw("12345")).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { offset: 0x0400, .. }));
    }

    /// EEPROM that is `Send` but not `Sync`.
    struct CellEeprom {
        inner: MemoryEeprom,
        reads: std::cell::Cell<usize>,
    }

    impl Eeprom for CellEeprom {
        fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError> {
            self.inner.write(offset, byte)
        }

        fn read(&mut self, offset: u16) -> Result<u8, StoreError> {
            self.reads.set(self.reads.get() + 1);
            self.inner.read(offset)
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn vault_futures_are_send_without_sync_eeprom() {
        let eeprom = CellEeprom { inner: MemoryEeprom::default(), reads: std::cell::Cell::new(0) };
        let mut vault = CredentialVault::new(eeprom, ManualEnv::default());
        let password = pw("12345");

        let persist = vault.persist(&password);
        assert_send(&persist);
        persist.await.unwrap();

        let load = vault.load();
        assert_send(&load);
        assert_eq!(load.await.unwrap().password().unwrap(), password);
        assert_eq!(vault.eeprom().reads.get(), CredentialRecord::SIZE);
    }

    #[tokio::test]
    async fn record_past_address_space_is_rejected_whole() {
        let config = VaultConfig { base_address: 0xFFFD, settle: Duration::ZERO };
        let eeprom = MemoryEeprom::new(usize::from(u16::MAX) + 1);
        let mut vault = CredentialVault::with_config(eeprom, ManualEnv::default(), config);

        let err = vault.persist(&pw("12345")).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { offset: 0xFFFD, .. }));
        assert!(vault.eeprom().cells()[0xFFFD..].iter().all(|&cell| cell == ERASED));

        assert!(matches!(vault.load().await, Err(StoreError::OutOfRange { .. })));
    }
}
