// Verified backups of the save file with a retention ceiling.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MAX_BACKUPS: usize = 10;

const HASH_BLOCK_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Save path {path:?} has no file name")]
    NoFileName { path: PathBuf },

    #[error("Backup {path:?} does not match the save file it was copied from")]
    HashMismatch { path: PathBuf },

    #[error("Backup {path:?} already exists")]
    AlreadyExists { path: PathBuf },
}

type DigestFn = fn(&Path) -> io::Result<Vec<u8>>;

#[derive(Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    max_backups: usize,
    digest: DigestFn,
}

impl fmt::Debug for BackupManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupManager")
            .field("backup_dir", &self.backup_dir)
            .field("max_backups", &self.max_backups)
            .finish_non_exhaustive()
    }
}

impl BackupManager {
    /// `max_backups` below 1 is treated as 1 so the newest backup is kept.
    pub fn new(backup_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            max_backups: max_backups.max(1),
            digest: sha256_file,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_digest(mut self, digest: DigestFn) -> Self {
        self.digest = digest;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Copies `source` into the backup directory and verifies the copy.
    ///
    /// The copy is named `<file name>-<YYYY-MM-DD>H<HH>M<MM>-<disambiguator>.dat`
    /// where the disambiguator is `tag` or a fresh v4 UUID. An existing file
    /// of that name is never overwritten. A copy that fails or does not
    /// verify is removed, and old backups are only evicted once the new one
    /// is verified.
    pub fn backup(&self, source: &Path, tag: Option<&str>) -> Result<PathBuf, BackupError> {
        self.backup_at(source, tag, Local::now())
    }

    fn backup_at(
        &self,
        source: &Path,
        tag: Option<&str>,
        now: DateTime<Local>,
    ) -> Result<PathBuf, BackupError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| BackupError::NoFileName {
                path: source.to_path_buf(),
            })?
            .to_string_lossy();

        fs::create_dir_all(&self.backup_dir)?;

        let disambiguator = match tag {
            Some(tag) => tag.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let stamp = now.format("%Y-%m-%dH%HM%M");
        let target = self
            .backup_dir
            .join(format!("{file_name}-{stamp}-{disambiguator}.dat"));

        let mut input = File::open(source)?;
        let output = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(BackupError::AlreadyExists { path: target })
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = self.copy_verified(&mut input, output, source, &target) {
            if let Err(remove_err) = fs::remove_file(&target) {
                log::warn!("Failed to remove unverified backup {:?}: {}", target, remove_err);
            }
            return Err(err);
        }
        log::debug!("Verified backup {:?}", target);

        self.evict_oldest()?;
        log::info!("Backed up {:?} to {:?}", source, target);
        Ok(target)
    }

    fn copy_verified(
        &self,
        input: &mut File,
        mut output: File,
        source: &Path,
        target: &Path,
    ) -> Result<(), BackupError> {
        io::copy(input, &mut output)?;
        output.sync_all()?;
        drop(output);

        if (self.digest)(source)? != (self.digest)(target)? {
            return Err(BackupError::HashMismatch {
                path: target.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Backup files ordered from oldest to newest modification time.
    pub fn backups(&self) -> Result<Vec<PathBuf>, BackupError> {
        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                entries.push((metadata.modified()?, entry.path()));
            }
        }
        entries.sort();
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }

    fn evict_oldest(&self) -> Result<(), BackupError> {
        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for path in backups.into_iter().take(excess) {
            fs::remove_file(&path)?;
            log::debug!("Evicted old backup {:?}", path);
        }
        Ok(())
    }
}

/// SHA-256 of a file, read in 1 MiB blocks.
pub fn sha256_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut block = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn save_file(dir: &Path) -> PathBuf {
        let path = dir.join("save_shared_1.dat");
        fs::write(&path, b"{ \"save_version\": \"0.31 production\" }").unwrap();
        path
    }

    #[test]
    fn test_backup_name_and_contents() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager = BackupManager::new(temp_dir.path().join("backup"), 10);

        let backup = manager.backup(&save, Some("manual")).unwrap();

        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("save_shared_1.dat-"));
        assert!(name.ends_with("-manual.dat"));
        // save_shared_1.dat-YYYY-MM-DDHhhMmm-manual.dat
        let stamp = &name["save_shared_1.dat-".len()..name.len() - "-manual.dat".len()];
        assert_eq!(stamp.len(), "2024-01-31H09M05".len());
        assert_eq!(&stamp[10..11], "H");
        assert_eq!(&stamp[13..14], "M");
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&save).unwrap());
    }

    #[test]
    fn test_random_disambiguator() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager = BackupManager::new(temp_dir.path().join("backup"), 10);

        let first = manager.backup(&save, None).unwrap();
        let second = manager.backup(&save, None).unwrap();
        assert_ne!(first, second);
        assert_eq!(manager.backups().unwrap().len(), 2);
    }

    fn set_mtime(path: &Path, mtime: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn mismatched_digest(path: &Path) -> io::Result<Vec<u8>> {
        Ok(path.to_string_lossy().into_owned().into_bytes())
    }

    fn failing_target_digest(path: &Path) -> io::Result<Vec<u8>> {
        let in_backup_dir = path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == "backup");
        if in_backup_dir {
            return Err(io::Error::new(io::ErrorKind::Other, "read failed"));
        }
        sha256_file(path)
    }

    #[test]
    fn test_eviction_follows_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager = BackupManager::new(temp_dir.path().join("backup"), 3);
        let base = SystemTime::now() - Duration::from_secs(3600);

        let made: Vec<PathBuf> = (0..3)
            .map(|i| manager.backup(&save, Some(&format!("b{i}"))).unwrap())
            .collect();
        // The last created, lexically last backup gets the oldest mtime.
        set_mtime(&made[2], base);
        set_mtime(&made[0], base + Duration::from_secs(60));
        set_mtime(&made[1], base + Duration::from_secs(120));

        let newest = manager.backup(&save, Some("b3")).unwrap();

        assert!(!made[2].exists());
        assert_eq!(
            manager.backups().unwrap(),
            vec![made[0].clone(), made[1].clone(), newest]
        );
    }

    #[test]
    fn test_hash_mismatch_removes_copy_and_keeps_old_backups() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let backup_dir = temp_dir.path().join("backup");
        let earlier = BackupManager::new(&backup_dir, 1)
            .backup(&save, Some("good"))
            .unwrap();

        let manager = BackupManager::new(&backup_dir, 1).with_digest(mismatched_digest);
        let err = manager.backup(&save, Some("bad")).unwrap_err();

        let BackupError::HashMismatch { path } = err else {
            panic!("expected a hash mismatch, got {err:?}");
        };
        assert!(!path.exists());
        assert_eq!(manager.backups().unwrap(), vec![earlier]);
    }

    #[test]
    fn test_failed_verification_removes_copy() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager =
            BackupManager::new(temp_dir.path().join("backup"), 10).with_digest(failing_target_digest);

        let err = manager.backup(&save, Some("unread")).unwrap_err();
        assert!(matches!(err, BackupError::Io(_)));
        assert!(manager.backups().unwrap().is_empty());
    }

    #[test]
    fn test_existing_backup_is_never_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager = BackupManager::new(temp_dir.path().join("backup"), 10);
        let now = Local::now();

        let first = manager.backup_at(&save, Some("same"), now).unwrap();
        fs::write(&save, b"{ \"save_version\": \"changed\" }").unwrap();
        let err = manager.backup_at(&save, Some("same"), now).unwrap_err();

        assert!(matches!(err, BackupError::AlreadyExists { ref path } if *path == first));
        assert_eq!(
            fs::read(&first).unwrap(),
            b"{ \"save_version\": \"0.31 production\" }"
        );
        assert_eq!(manager.backups().unwrap(), vec![first]);
    }

    #[test]
    fn test_zero_cap_keeps_one() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let manager = BackupManager::new(temp_dir.path().join("backup"), 0);
        let backup = manager.backup(&save, Some("only")).unwrap();
        assert_eq!(manager.backups().unwrap(), vec![backup]);
    }

    #[test]
    fn test_subdirectories_are_not_counted() {
        let temp_dir = TempDir::new().unwrap();
        let save = save_file(temp_dir.path());
        let backup_dir = temp_dir.path().join("backup");
        fs::create_dir_all(backup_dir.join("nested")).unwrap();
        let manager = BackupManager::new(&backup_dir, 1);

        manager.backup(&save, Some("a")).unwrap();
        assert!(backup_dir.join("nested").is_dir());
        assert_eq!(manager.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("backup"), 10);
        let err = manager
            .backup(&temp_dir.path().join("absent.dat"), None)
            .unwrap_err();
        assert!(matches!(err, BackupError::Io(_)));
        assert!(manager.backups().unwrap().is_empty());
    }

    #[test]
    fn test_sha256_of_known_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();
        let hex: String = sha256_file(&path)
            .unwrap()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        assert_eq!(
            hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
