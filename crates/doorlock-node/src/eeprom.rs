//! File-backed EEPROM image.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use doorlock_core::store::{DEFAULT_CAPACITY, ERASED, Eeprom, StoreError};

/// Durable EEPROM stored as a fixed-size image file.
///
/// A missing file is created erased (every byte `0xFF`). Each write is
/// flushed to disk before returning, so a credential survives a restart.
#[derive(Debug)]
pub struct FileEeprom {
    file: File,
    capacity: usize,
}

impl FileEeprom {
    /// Open or create an image of [`DEFAULT_CAPACITY`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_capacity(path, DEFAULT_CAPACITY)
    }

    /// Open or create an image of `capacity` bytes.
    ///
    /// An existing shorter image is extended with erased bytes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be opened or initialized.
    pub fn open_with_capacity(path: impl AsRef<Path>, capacity: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let mut file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(path)?;

        let current = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);
        if current < capacity {
            file.seek(SeekFrom::Start(current as u64))?;
            file.write_all(&vec![ERASED; capacity - current])?;
            file.sync_all()?;
            tracing::info!(path = %path.display(), capacity, "initialized eeprom image");
        }

        Ok(Self { file, capacity })
    }

    fn seek_to(&mut self, offset: u16) -> Result<(), StoreError> {
        if usize::from(offset) >= self.capacity {
            return Err(StoreError::OutOfRange { offset, capacity: self.capacity });
        }
        self.file.seek(SeekFrom::Start(u64::from(offset)))?;
        Ok(())
    }
}

impl Eeprom for FileEeprom {
    fn write(&mut self, offset: u16, byte: u8) -> Result<(), StoreError> {
        self.seek_to(offset)?;
        self.file.write_all(&[byte])?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read(&mut self, offset: u16) -> Result<u8, StoreError> {
        self.seek_to(offset)?;
        let mut byte = [0u8; 1];
        self.file.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doorlock_core::store::CredentialVault;
    use doorlock_proto::Password;

    use super::*;
    use crate::SystemEnv;

    #[test]
    fn new_image_is_erased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");

        let mut eeprom = FileEeprom::open(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024);
        assert_eq!(eeprom.read(0).unwrap(), 0xFF);
        assert_eq!(eeprom.read(0x03FF).unwrap(), 0xFF);
    }

    #[test]
    fn rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut eeprom = FileEeprom::open(dir.path().join("eeprom.bin")).unwrap();

        assert!(matches!(eeprom.write(0x0400, 1), Err(StoreError::OutOfRange { .. })));
        assert!(matches!(eeprom.read(0xFFFF), Err(StoreError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn credential_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");
        let password: Password = "24680".parse().unwrap();

        {
            let mut vault = CredentialVault::new(FileEeprom::open(&path).unwrap(), SystemEnv);
            vault.persist(&password).await.unwrap();
        }

        let mut vault = CredentialVault::new(FileEeprom::open(&path).unwrap(), SystemEnv);
        let record = vault.load().await.unwrap();
        assert_eq!(record.password().unwrap(), password);

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[0x0311..=0x0316], b"24680#");
    }
}
