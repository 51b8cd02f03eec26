use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::{self, ReadOptions, Value};
use crate::golden::{GoldenStore, SaveValidator, ValidationStrategy};

use super::atomic::atomic_write;
use super::backup::BackupManager;
use super::SaveError;

/// Reads the save file and writes edited documents back to it.
///
/// A write only reaches the save file after the document passed validation
/// and a verified backup of the current file exists.
pub struct SaveManager {
    save_path: PathBuf,
    backups: BackupManager,
    validator: Box<dyn SaveValidator>,
    read_options: ReadOptions,
}

impl SaveManager {
    /// Manager using the typed schema bundled with the library.
    pub fn new(save_path: impl Into<PathBuf>, backups: BackupManager) -> Self {
        Self {
            save_path: save_path.into(),
            backups,
            validator: ValidationStrategy::default().validator(GoldenStore::Bundled),
            read_options: ReadOptions::default(),
        }
    }

    pub fn with_validator(mut self, validator: Box<dyn SaveValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_read_options(mut self, read_options: ReadOptions) -> Self {
        self.read_options = read_options;
        self
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn validator_name(&self) -> &'static str {
        self.validator.name()
    }

    pub fn load(&self) -> Result<Value, SaveError> {
        let bytes = fs::read(&self.save_path)?;
        let save = codec::from_slice(&bytes, self.read_options)?;
        log::debug!("Loaded {} bytes from {:?}", bytes.len(), self.save_path);
        Ok(save)
    }

    /// Checks `save` against the golden file for its version.
    ///
    /// `save` may be normalized during the check but is restored before
    /// this returns.
    pub fn verify(&self, save: &mut Value) -> Result<(), SaveError> {
        self.validator.validate(save)?;
        log::debug!("Save passed {} validation", self.validator.name());
        Ok(())
    }

    pub fn backup(&self, tag: Option<&str>) -> Result<PathBuf, SaveError> {
        Ok(self.backups.backup(&self.save_path, tag)?)
    }

    /// Validates `save`, backs up the current file, then atomically replaces
    /// it with the encoded document.
    pub fn write(&self, save: &mut Value) -> Result<(), SaveError> {
        self.verify(save)?;
        self.backup(None)?;

        atomic_write(&self.save_path, |out| codec::to_writer(out, save))?;
        log::info!("Saved {:?}", self.save_path);
        Ok(())
    }
}
