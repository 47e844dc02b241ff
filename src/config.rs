//! Configuration types for the sync pipelines.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Runtime bundle source and install locations.
    pub bundle: BundleConfig,
    /// HTTP client settings shared by every remote call.
    pub http: HttpConfig,
    /// Application self-update channel.
    pub self_update: SelfUpdateConfig,
}

/// Where the runtime bundle comes from and where it is installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Registry package name (e.g. `"@ffmpeg/core"`).
    pub package: String,
    /// Base URL of the package registry metadata API.
    pub registry_url: String,
    /// Base URL of the CDN serving individual package files.
    pub cdn_url: String,
    /// Directory inside the published package holding the files.
    pub dist_path: String,
    /// File names fetched from `dist_path` on every update.
    pub files: Vec<String>,
    /// Installed bundle directory (None = `dirs::bundle_dir()`).
    pub install_dir: Option<PathBuf>,
    /// Version record path (None = `dirs::version_file()`).
    pub version_file: Option<PathBuf>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            package: "@ffmpeg/core".to_owned(),
            registry_url: "https://registry.npmjs.org".to_owned(),
            cdn_url: "https://unpkg.com".to_owned(),
            dist_path: "dist/esm".to_owned(),
            files: vec!["ffmpeg-core.js".to_owned(), "ffmpeg-core.wasm".to_owned()],
            install_dir: None,
            version_file: None,
        }
    }
}

impl BundleConfig {
    /// Installed bundle directory, falling back to the platform default.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.install_dir
            .clone()
            .unwrap_or_else(crate::dirs::bundle_dir)
    }

    /// Version record path, falling back to the platform default.
    #[must_use]
    pub fn version_file(&self) -> PathBuf {
        self.version_file
            .clone()
            .unwrap_or_else(crate::dirs::version_file)
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-read timeout in seconds. Large bundles stream for a while, so this
    /// bounds stalls rather than total transfer time.
    pub read_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("assetsync/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 15,
            read_timeout_secs: 300,
        }
    }
}

impl HttpConfig {
    /// Build a `reqwest` client from these settings.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the TLS backend cannot be initialised.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .read_timeout(Duration::from_secs(self.read_timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {e}")))
    }
}

/// Self-update channel settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfUpdateConfig {
    /// URL of the update manifest (None = self-update disabled).
    pub endpoint: Option<String>,
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path (`dirs::config_file()`).
    pub fn default_config_path() -> PathBuf {
        crate::dirs::config_file()
    }

    /// Check the values a sync run depends on.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let bundle = &self.bundle;
        if bundle.package.trim().is_empty() {
            return Err(SyncError::Config("bundle.package is empty".to_owned()));
        }
        if bundle.files.is_empty() {
            return Err(SyncError::Config("bundle.files is empty".to_owned()));
        }
        for file in &bundle.files {
            if file.is_empty() || file.contains(['/', '\\']) || file == "." || file == ".." {
                return Err(SyncError::Config(format!(
                    "bundle.files entry `{file}` must be a plain file name"
                )));
            }
        }
        check_http_url("bundle.registry_url", &bundle.registry_url)?;
        check_http_url("bundle.cdn_url", &bundle.cdn_url)?;
        if let Some(endpoint) = &self.self_update.endpoint {
            check_http_url("self_update.endpoint", endpoint)?;
        }
        Ok(())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| SyncError::Config(format!("{field} `{value}` is not a URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SyncError::Config(format!(
            "{field} must use http or https, got `{other}`"
        ))),
    }
}
