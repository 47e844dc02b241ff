//! Check-and-update orchestration for the runtime bundle.

use crate::bundle::fetcher::{AssetFetcher, Transfer};
use crate::bundle::install::BundleInstaller;
use crate::bundle::resolver::{RegistryResolver, RemoteVersionInfo, VersionResolver};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::progress::ProgressFn;
use crate::update::{LocalVersionStore, UpdatePlan, decide_with};
use std::path::PathBuf;

/// Where the files of a given bundle version are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSource {
    /// CDN base URL.
    pub cdn_url: String,
    /// Registry package name.
    pub package: String,
    /// Directory inside the package.
    pub dist_path: String,
    /// File names making up the bundle.
    pub files: Vec<String>,
}

impl BundleSource {
    /// URL of `file` in `version` of the package.
    pub fn file_url(&self, version: &str, file: &str) -> String {
        let dist = self.dist_path.trim_matches('/');
        let base = self.cdn_url.trim_end_matches('/');
        if dist.is_empty() {
            format!("{base}/{}@{version}/{file}", self.package)
        } else {
            format!("{base}/{}@{version}/{dist}/{file}", self.package)
        }
    }
}

/// Result of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The installed version already matched the remote one.
    UpToDate {
        /// Installed version.
        version: String,
    },
    /// A new version was fetched, installed, and recorded.
    Updated {
        /// Version installed before, if one was recorded.
        previous: Option<String>,
        /// Version now installed.
        version: String,
    },
}

/// Snapshot of local bundle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStatus {
    /// Version named by the record, if readable.
    pub recorded_version: Option<String>,
    /// Installed bundle directory.
    pub install_dir: PathBuf,
    /// Whether every configured file is present.
    pub complete: bool,
}

/// Keeps the installed bundle in line with the registry's latest version.
pub struct BundleSync<R> {
    resolver: R,
    fetcher: AssetFetcher,
    installer: BundleInstaller,
    store: LocalVersionStore,
    source: BundleSource,
}

impl BundleSync<RegistryResolver> {
    /// Wire up a registry-backed sync from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let client = config.http.build_client()?;
        let bundle = &config.bundle;
        Ok(Self::new(
            RegistryResolver::new(client.clone(), &bundle.registry_url, &bundle.package),
            AssetFetcher::new(client),
            BundleInstaller::new(bundle.install_dir()),
            LocalVersionStore::new(bundle.version_file()),
            BundleSource {
                cdn_url: bundle.cdn_url.clone(),
                package: bundle.package.clone(),
                dist_path: bundle.dist_path.clone(),
                files: bundle.files.clone(),
            },
        ))
    }
}

impl<R: VersionResolver> BundleSync<R> {
    /// Assemble a sync from its parts.
    pub fn new(
        resolver: R,
        fetcher: AssetFetcher,
        installer: BundleInstaller,
        store: LocalVersionStore,
        source: BundleSource,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            installer,
            store,
            source,
        }
    }

    /// Version store backing this sync.
    pub fn store(&self) -> &LocalVersionStore {
        &self.store
    }

    /// Installer backing this sync.
    pub fn installer(&self) -> &BundleInstaller {
        &self.installer
    }

    /// Installed version, or `None` if unknown or the files are incomplete.
    pub fn local_version(&self) -> Option<String> {
        let recorded = self.store.read()?;
        if self.installer.is_complete(&self.source.files) {
            Some(recorded)
        } else {
            tracing::warn!(
                version = %recorded,
                dir = %self.installer.install_dir().display(),
                "recorded bundle is incomplete on disk; treating as not installed"
            );
            None
        }
    }

    /// Local state without touching the network.
    pub fn status(&self) -> BundleStatus {
        BundleStatus {
            recorded_version: self.store.read(),
            install_dir: self.installer.install_dir().to_owned(),
            complete: self.installer.is_complete(&self.source.files),
        }
    }

    /// Compare the installed version with the registry's latest.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Network` or `SyncError::MalformedResponse` from
    /// the resolver.
    pub async fn check(&self) -> Result<UpdatePlan<RemoteVersionInfo>> {
        let remote = self.resolver.latest_version().await?;
        let local = self.local_version();
        let latest = remote.latest.clone();
        Ok(decide_with(local.as_deref(), &latest, remote))
    }

    /// Bring the installed bundle up to date.
    ///
    /// # Errors
    ///
    /// Propagates resolver, transfer, and install errors. The version record
    /// is left untouched on any failure.
    pub async fn sync(&self, on_event: &ProgressFn<'_>) -> Result<SyncOutcome> {
        self.sync_with(false, on_event).await
    }

    /// Like [`sync`](Self::sync); `force` reinstalls even when up to date.
    ///
    /// # Errors
    ///
    /// See [`sync`](Self::sync).
    pub async fn sync_with(&self, force: bool, on_event: &ProgressFn<'_>) -> Result<SyncOutcome> {
        self.installer.recover()?;

        let remote = self.resolver.latest_version().await?;
        let local = self.local_version();
        let plan = decide_with(local.as_deref(), &remote.latest, ());

        let version = match plan {
            UpdatePlan::UpToDate if !force => {
                tracing::info!(version = %remote.latest, "bundle already up to date");
                return Ok(SyncOutcome::UpToDate {
                    version: remote.latest,
                });
            }
            UpdatePlan::UpToDate => remote.latest,
            UpdatePlan::UpdateAvailable { remote_version, .. } => remote_version,
        };

        tracing::info!(
            from = local.as_deref().unwrap_or("none"),
            to = %version,
            "updating bundle"
        );

        let staging = self.installer.stage()?;
        let transfers: Vec<Transfer> = self
            .source
            .files
            .iter()
            .map(|file| Transfer {
                url: self.source.file_url(&version, file),
                dest: staging.join(file),
            })
            .collect();
        self.fetcher.fetch_all(&transfers, on_event).await?;

        self.installer.commit(staging)?;
        self.store.write(&version)?;

        tracing::info!(version = %version, "bundle update complete");
        Ok(SyncOutcome::Updated {
            previous: local,
            version,
        })
    }
}
