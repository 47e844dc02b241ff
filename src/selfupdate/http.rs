//! Self-update channel backed by a JSON manifest over HTTP.
//!
//! The manifest names the latest release and one download per platform:
//!
//! ```json
//! {
//!   "version": "1.4.0",
//!   "notes": "Bug fixes",
//!   "pub_date": "2026-09-30T12:00:00Z",
//!   "platforms": {
//!     "linux-x86_64": { "url": "https://example.com/app-linux", "size": 123456 }
//!   }
//! }
//! ```
//!
//! Any `version` different from the running one is offered. Installing
//! downloads the platform binary next to the target and swaps it in.

use crate::bundle::fetcher::AssetFetcher;
use crate::error::{Result, SyncError};
use crate::progress::ProgressFn;
use crate::selfupdate::channel::{PendingUpdate, ReleaseInfo, UpdateChannel};
use crate::update::{UpdatePlan, decide_with};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct UpdateManifest {
    version: String,
    notes: Option<String>,
    pub_date: Option<String>,
    #[serde(default)]
    platforms: HashMap<String, PlatformAsset>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlatformAsset {
    url: String,
    size: Option<u64>,
}

/// Platform key used in manifests: `<os>-<arch>`, with macOS as `darwin`.
pub fn current_target() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    format!("{os}-{}", std::env::consts::ARCH)
}

/// Update channel reading a release manifest from `endpoint`.
#[derive(Debug, Clone)]
pub struct HttpUpdateChannel {
    client: reqwest::Client,
    endpoint: String,
    current_version: String,
    target: String,
    install_path: PathBuf,
}

impl HttpUpdateChannel {
    /// Channel for the running executable at its current version.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Install` if the current executable path cannot be
    /// determined.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Result<Self> {
        let install_path = std::env::current_exe().map_err(|e| {
            SyncError::Install(format!("cannot determine current executable path: {e}"))
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            current_version: env!("CARGO_PKG_VERSION").to_owned(),
            target: current_target(),
            install_path,
        })
    }

    /// Compare against `version` instead of this crate's version.
    #[must_use]
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    /// Look up downloads under `target` instead of [`current_target`].
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Install to `path` instead of the running executable.
    #[must_use]
    pub fn with_install_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.install_path = path.into();
        self
    }

    async fn fetch_manifest(&self) -> Result<UpdateManifest> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("cannot reach {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Network(format!(
                "update endpoint {} returned {status}",
                self.endpoint
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("cannot read update manifest: {e}")))?;
        let manifest: UpdateManifest = serde_json::from_slice(&body)
            .map_err(|e| SyncError::MalformedResponse(format!("bad update manifest: {e}")))?;
        if manifest.version.trim().is_empty() {
            return Err(SyncError::MalformedResponse(
                "update manifest has an empty version".to_owned(),
            ));
        }
        Ok(manifest)
    }
}

#[async_trait]
impl UpdateChannel for HttpUpdateChannel {
    async fn check_for_update(&self) -> Result<Option<Box<dyn PendingUpdate>>> {
        let manifest = self.fetch_manifest().await?;
        let plan = decide_with(
            Some(self.current_version.as_str()),
            &manifest.version,
            manifest.platforms.get(&self.target).cloned(),
        );

        let (version, asset) = match plan {
            UpdatePlan::UpToDate => return Ok(None),
            UpdatePlan::UpdateAvailable {
                remote_version,
                metadata,
            } => (remote_version, metadata),
        };
        let asset = asset.ok_or_else(|| {
            SyncError::MalformedResponse(format!(
                "release {version} has no download for {}",
                self.target
            ))
        })?;

        let update: Box<dyn PendingUpdate> = Box::new(HttpPendingUpdate {
            info: ReleaseInfo {
                version,
                release_date: manifest.pub_date,
                release_notes: manifest.notes,
                size_hint: asset.size,
            },
            url: asset.url,
            fetcher: AssetFetcher::new(self.client.clone()),
            install_path: self.install_path.clone(),
        });
        Ok(Some(update))
    }
}

struct HttpPendingUpdate {
    info: ReleaseInfo,
    url: String,
    fetcher: AssetFetcher,
    install_path: PathBuf,
}

#[async_trait]
impl PendingUpdate for HttpPendingUpdate {
    fn info(&self) -> &ReleaseInfo {
        &self.info
    }

    async fn download_and_install(&self, on_event: &ProgressFn<'_>) -> Result<()> {
        let download = download_path(&self.install_path);
        tracing::info!(url = %self.url, "downloading application update");

        let result = match self.fetcher.fetch(&self.url, &download, on_event).await {
            Ok(_) => install_binary(&download, &self.install_path),
            Err(e) => Err(e),
        };
        if result.is_err() {
            let _ = std::fs::remove_file(&download);
        }
        result
    }
}

/// Sibling path the new binary is downloaded to before the swap.
fn download_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_owned());
    target.with_file_name(format!(".{name}.download"))
}

/// Put `new_binary` in place of `target`.
///
/// The running executable goes through `self-replace` (Windows cannot
/// overwrite a live image); any other target is swapped with renames.
fn install_binary(new_binary: &Path, target: &Path) -> Result<()> {
    set_executable(new_binary)?;

    if is_current_exe(target) {
        self_replace::self_replace(new_binary).map_err(|e| {
            SyncError::Install(format!("cannot replace running executable: {e}"))
        })?;
        let _ = std::fs::remove_file(new_binary);
        tracing::info!(path = %target.display(), "running executable replaced");
        return Ok(());
    }

    replace_binary(new_binary, target)
}

fn is_current_exe(target: &Path) -> bool {
    let Ok(exe) = std::env::current_exe() else {
        return false;
    };
    match (exe.canonicalize(), target.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Rename old → backup, new → target, drop backup.
fn replace_binary(new_binary: &Path, target: &Path) -> Result<()> {
    let backup = target.with_extension("old");

    if target.exists() {
        std::fs::rename(target, &backup).map_err(|e| {
            SyncError::Install(format!(
                "cannot back up {} -> {}: {e}",
                target.display(),
                backup.display()
            ))
        })?;
    }

    std::fs::rename(new_binary, target).map_err(|e| {
        if backup.exists() {
            if let Err(restore) = std::fs::rename(&backup, target) {
                tracing::error!(
                    backup = %backup.display(),
                    "cannot restore previous binary: {restore}"
                );
            }
        }
        SyncError::Install(format!("cannot install new binary to {}: {e}", target.display()))
    })?;

    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("xattr")
            .args(["-c", &target.to_string_lossy()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }

    let _ = std::fs::remove_file(&backup);
    tracing::info!(path = %target.display(), "binary updated");
    Ok(())
}

fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
            SyncError::Install(format!(
                "cannot set executable permission on {}: {e}",
                path.display()
            ))
        })?;
    }
    let _ = path;
    Ok(())
}
