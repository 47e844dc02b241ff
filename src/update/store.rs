//! Installed-version record persistence.
//!
//! The record is a single JSON object, `{ "version": "<id>" }`, and is the
//! only durable state of the bundle pipeline. A missing or unparsable file
//! means "nothing known to be installed".

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persisted record of the currently installed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Installed version identifier.
    pub version: String,
}

/// Reads and writes the [`VersionRecord`] at a fixed path.
#[derive(Debug, Clone)]
pub struct LocalVersionStore {
    path: PathBuf,
}

impl LocalVersionStore {
    /// Create a store backed by `path`. Nothing is read until asked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, distinguishing "absent" from "unreadable".
    ///
    /// # Errors
    ///
    /// Returns `SyncError::LocalStateUnreadable` if the file exists but cannot
    /// be read or does not hold a `version` string.
    pub fn load(&self) -> Result<Option<VersionRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::LocalStateUnreadable(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            SyncError::LocalStateUnreadable(format!(
                "cannot parse {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Last persisted version, or `None` if absent or unreadable.
    ///
    /// An unreadable record is logged and treated as "no version installed",
    /// which forces a full reinstall on the next sync.
    pub fn read(&self) -> Option<String> {
        match self.load() {
            Ok(record) => record.map(|r| r.version),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring version record: {e}");
                None
            }
        }
    }

    /// Persist `version`, replacing any previous record.
    ///
    /// Written to a sibling temp file, fsynced, then renamed over the record
    /// so readers never observe a partial file.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Install` if any step fails. The update is not
    /// complete without a durable record.
    pub fn write(&self, version: &str) -> Result<()> {
        let record = VersionRecord {
            version: version.to_owned(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| SyncError::Install(format!("cannot serialize version record: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Install(format!(
                    "cannot create record directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| {
            SyncError::Install(format!(
                "cannot create temp record {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| {
                SyncError::Install(format!(
                    "cannot write temp record {}: {e}",
                    tmp_path.display()
                ))
            })?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            SyncError::Install(format!(
                "cannot promote version record {} -> {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })?;

        tracing::debug!(path = %self.path.display(), version, "version record written");
        Ok(())
    }
}
