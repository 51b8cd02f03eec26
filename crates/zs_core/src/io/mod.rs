// Save file I/O
// Loading, verified backups, and the validate -> backup -> atomic write
// pipeline.

pub mod atomic;
pub mod backup;
pub mod manager;

use thiserror::Error;

use crate::codec::{CodecError, ValueType};
use crate::golden::{GoldenError, ValidationReport};
use crate::model::ModelError;

pub use atomic::atomic_write;
pub use backup::{sha256_file, BackupError, BackupManager, DEFAULT_MAX_BACKUPS};
pub use manager::SaveManager;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode save: {0}")]
    Codec(#[from] CodecError),

    #[error("Save is missing the `save_version` field")]
    MissingVersion,

    #[error("`save_version` must be a string, found {found}")]
    VersionNotString { found: ValueType },

    #[error("Failed during set up of integrity check")]
    IntegritySetup(#[source] GoldenError),

    #[error("Save not formatted properly: {0}")]
    NotFormatted(ValidationReport),

    #[error("Failed to create a backup file")]
    Backup(#[source] BackupError),

    #[error("The SHA-256 hash of the written backup file and original save file do not match")]
    HashMismatch,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<GoldenError> for SaveError {
    fn from(err: GoldenError) -> Self {
        match err {
            GoldenError::MissingVersion => SaveError::MissingVersion,
            GoldenError::VersionNotString { found } => SaveError::VersionNotString { found },
            GoldenError::Mismatch(report) => SaveError::NotFormatted(report),
            GoldenError::Compare(err) => {
                SaveError::NotFormatted(ValidationReport::single("", err.to_string()))
            }
            setup => SaveError::IntegritySetup(setup),
        }
    }
}

impl From<BackupError> for SaveError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::HashMismatch { .. } => SaveError::HashMismatch,
            other => SaveError::Backup(other),
        }
    }
}
