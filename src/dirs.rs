//! Well-known filesystem locations for synced state.
//!
//! Uses the [`dirs`](::dirs) crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/assetsync/` | `~/.local/share/assetsync/` |
//! | Config | `~/Library/Application Support/assetsync/` | `~/.config/assetsync/` |
//!
//! # Environment Overrides
//!
//! - `ASSETSYNC_DATA_DIR` overrides [`data_dir`]
//! - `ASSETSYNC_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the installed runtime bundle and its version record unless the
/// configuration points them elsewhere.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ASSETSYNC_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    ::dirs::data_dir()
        .map(|d| d.join("assetsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/assetsync-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ASSETSYNC_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    ::dirs::config_dir()
        .map(|d| d.join("assetsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/assetsync-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default installed bundle directory (`data_dir()/bundle/`).
#[must_use]
pub fn bundle_dir() -> PathBuf {
    data_dir().join("bundle")
}

/// Default version record path (`data_dir()/bundle-version.json`).
#[must_use]
pub fn version_file() -> PathBuf {
    data_dir().join("bundle-version.json")
}
