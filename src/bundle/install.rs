//! Wholesale replacement of the installed bundle directory.
//!
//! New content is fetched into a fresh staging directory next to the install
//! location, then swapped in with renames:
//!
//! 1. `<name>` → `.<name>.previous` (if an install exists)
//! 2. `.<name>.staging-<uuid>` → `<name>`
//! 3. `.<name>.previous` is removed
//!
//! A crash between steps 1 and 2 leaves only the backup behind;
//! [`BundleInstaller::recover`] puts it back before the next sync reads the
//! version record, so the record never outlives the files it describes.

use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};

/// A staging directory that is deleted on drop unless committed.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    armed: bool,
}

impl StagingDir {
    /// Staging directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `file` inside the staging directory.
    pub fn join(&self, file: &str) -> PathBuf {
        self.path.join(file)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), "cannot remove staging dir: {e}");
                }
            }
        }
    }
}

/// Owns the installed bundle directory.
#[derive(Debug, Clone)]
pub struct BundleInstaller {
    install_dir: PathBuf,
}

impl BundleInstaller {
    /// Installer managing `install_dir`.
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    /// Installed bundle directory.
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    fn parent(&self) -> &Path {
        self.install_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn dir_name(&self) -> String {
        self.install_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_owned())
    }

    fn backup_path(&self) -> PathBuf {
        self.parent().join(format!(".{}.previous", self.dir_name()))
    }

    fn staging_prefix(&self) -> String {
        format!(".{}.staging-", self.dir_name())
    }

    /// Returns `true` if the install directory holds every file in `files`.
    pub fn is_complete(&self, files: &[String]) -> bool {
        self.install_dir.is_dir() && files.iter().all(|f| self.install_dir.join(f).is_file())
    }

    /// Create an empty, uniquely named staging directory beside the install.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Install` if the directory cannot be created.
    pub fn stage(&self) -> Result<StagingDir> {
        let parent = self.parent();
        std::fs::create_dir_all(parent).map_err(|e| {
            SyncError::Install(format!("cannot create {}: {e}", parent.display()))
        })?;

        let path = parent.join(format!("{}{}", self.staging_prefix(), uuid::Uuid::new_v4()));
        std::fs::create_dir(&path).map_err(|e| {
            SyncError::Install(format!("cannot create staging dir {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), "staging directory created");
        Ok(StagingDir { path, armed: true })
    }

    /// Swap `staging` in as the installed bundle.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Install` if either rename fails. The previous
    /// install is restored when the second rename fails.
    pub fn commit(&self, mut staging: StagingDir) -> Result<()> {
        let backup = self.backup_path();
        if backup.exists() {
            std::fs::remove_dir_all(&backup).map_err(|e| {
                SyncError::Install(format!("cannot clear stale backup {}: {e}", backup.display()))
            })?;
        }

        let had_previous = self.install_dir.symlink_metadata().is_ok();
        if had_previous {
            std::fs::rename(&self.install_dir, &backup).map_err(|e| {
                SyncError::Install(format!(
                    "cannot move {} aside: {e}",
                    self.install_dir.display()
                ))
            })?;
        }

        if let Err(e) = std::fs::rename(&staging.path, &self.install_dir) {
            if had_previous {
                if let Err(restore) = std::fs::rename(&backup, &self.install_dir) {
                    tracing::error!(
                        backup = %backup.display(),
                        "cannot restore previous bundle: {restore}"
                    );
                }
            }
            return Err(SyncError::Install(format!(
                "cannot promote {} to {}: {e}",
                staging.path.display(),
                self.install_dir.display()
            )));
        }
        staging.armed = false;

        if had_previous {
            if let Err(e) = std::fs::remove_dir_all(&backup) {
                tracing::warn!(path = %backup.display(), "cannot remove previous bundle: {e}");
            }
        }

        tracing::info!(path = %self.install_dir.display(), "bundle installed");
        Ok(())
    }

    /// Undo the effects of an interrupted [`commit`](Self::commit).
    ///
    /// Restores the backup if the install directory is missing, otherwise
    /// drops it, and removes leftover staging directories.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Install` if the backup cannot be restored.
    pub fn recover(&self) -> Result<()> {
        let backup = self.backup_path();
        if backup.is_dir() {
            if self.install_dir.symlink_metadata().is_err() {
                std::fs::rename(&backup, &self.install_dir).map_err(|e| {
                    SyncError::Install(format!(
                        "cannot restore {} from {}: {e}",
                        self.install_dir.display(),
                        backup.display()
                    ))
                })?;
                tracing::warn!(
                    path = %self.install_dir.display(),
                    "restored bundle from interrupted swap"
                );
            } else if let Err(e) = std::fs::remove_dir_all(&backup) {
                tracing::warn!(path = %backup.display(), "cannot remove previous bundle: {e}");
            }
        }

        let entries = match std::fs::read_dir(self.parent()) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };
        let prefix = self.staging_prefix();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                tracing::debug!(path = %entry.path().display(), "removing stale staging dir");
                let _ = std::fs::remove_dir_all(entry.path());
            }
        }
        Ok(())
    }
}
