// Saver configuration
// File locations and pipeline knobs, optionally loaded from a YAML file.
// Unset paths fall back to the platform's local data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::ReadOptions;
use crate::golden::{GoldenStore, SaveValidator, ValidationStrategy};
use crate::io::{BackupManager, SaveManager, DEFAULT_MAX_BACKUPS};

const GAME_DIR: &str = "ZERO_Sievert";
const SAVE_FILE_NAME: &str = "save_shared_1.dat";
const PROGRAM_DIR: &str = "ZeroSaver";
const BACKUP_DIR: &str = "backup";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No local data directory on this platform; set `{field}` explicitly")]
    NoDataDir { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaverConfig {
    pub save_path: Option<PathBuf>,
    /// Folder under the game's data directory that holds the save file.
    pub save_folder_id: String,
    pub backup_dir: Option<PathBuf>,
    pub max_backups: usize,
    pub allow_non_finite: bool,
    pub validation: ValidationStrategy,
    /// Directory of golden files to use instead of the bundled ones.
    pub golden_dir: Option<PathBuf>,
}

impl Default for SaverConfig {
    fn default() -> Self {
        Self {
            save_path: None,
            save_folder_id: "91826839".to_string(),
            backup_dir: None,
            max_backups: DEFAULT_MAX_BACKUPS,
            allow_non_finite: false,
            validation: ValidationStrategy::default(),
            golden_dir: None,
        }
    }
}

impl SaverConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn resolve_save_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.save_path {
            return Ok(path.clone());
        }
        let data_dir =
            dirs::data_local_dir().ok_or(ConfigError::NoDataDir { field: "save_path" })?;
        Ok(data_dir
            .join(GAME_DIR)
            .join(&self.save_folder_id)
            .join(SAVE_FILE_NAME))
    }

    pub fn resolve_backup_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.backup_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_local_dir().ok_or(ConfigError::NoDataDir { field: "backup_dir" })?;
        Ok(data_dir.join(PROGRAM_DIR).join(BACKUP_DIR))
    }

    pub fn golden_store(&self) -> GoldenStore {
        match &self.golden_dir {
            Some(dir) => GoldenStore::Directory(dir.clone()),
            None => GoldenStore::Bundled,
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            allow_non_finite: self.allow_non_finite,
        }
    }

    pub fn validator(&self) -> Box<dyn SaveValidator> {
        self.validation.validator(self.golden_store())
    }

    pub fn save_manager(&self) -> Result<SaveManager, ConfigError> {
        let backups = BackupManager::new(self.resolve_backup_dir()?, self.max_backups);
        Ok(SaveManager::new(self.resolve_save_path()?, backups)
            .with_validator(self.validator())
            .with_read_options(self.read_options()))
    }
}
