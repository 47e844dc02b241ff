//! Registry lookup of the latest published bundle version.

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Deserialize;

/// Latest version as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVersionInfo {
    /// Version the `latest` dist-tag points at.
    pub latest: String,
}

/// Source of the latest published version identifier.
///
/// One call is one outbound request; implementations must not retry.
#[async_trait]
pub trait VersionResolver: Send + Sync {
    /// Query the remote authority for its latest version.
    async fn latest_version(&self) -> Result<RemoteVersionInfo>;
}

#[derive(Deserialize)]
struct PackageDocument {
    #[serde(rename = "dist-tags")]
    dist_tags: Option<DistTags>,
}

#[derive(Deserialize)]
struct DistTags {
    latest: Option<serde_json::Value>,
}

/// Resolves versions from an npm-compatible registry (`GET <registry>/<package>`).
#[derive(Debug, Clone)]
pub struct RegistryResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl RegistryResolver {
    /// Resolver for `package` on the registry at `registry_url`.
    pub fn new(client: reqwest::Client, registry_url: &str, package: &str) -> Self {
        let endpoint = format!("{}/{}", registry_url.trim_end_matches('/'), package);
        Self { client, endpoint }
    }

    /// Metadata URL queried by [`VersionResolver::latest_version`].
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VersionResolver for RegistryResolver {
    async fn latest_version(&self) -> Result<RemoteVersionInfo> {
        tracing::debug!(endpoint = %self.endpoint, "querying registry");

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
                "registry {} returned {status}",
                self.endpoint
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            SyncError::Network(format!("cannot read registry response: {e}"))
        })?;

        let latest = parse_latest(&body)?;
        tracing::info!(version = %latest, "latest registry version");
        Ok(RemoteVersionInfo { latest })
    }
}

/// Extract `dist-tags.latest` from a registry package document.
fn parse_latest(body: &[u8]) -> Result<String> {
    let document: PackageDocument = serde_json::from_slice(body)
        .map_err(|e| SyncError::MalformedResponse(format!("registry body is not JSON: {e}")))?;

    let latest = document
        .dist_tags
        .and_then(|tags| tags.latest)
        .ok_or_else(|| SyncError::MalformedResponse("dist-tags.latest missing".to_owned()))?;

    match latest {
        serde_json::Value::String(v) if !v.trim().is_empty() => Ok(v),
        other => Err(SyncError::MalformedResponse(format!(
            "dist-tags.latest is not a version string: {other}"
        ))),
    }
}
