//! Capability interface to a platform self-update mechanism.
//!
//! The update flow only sees these traits; concrete updaters live behind
//! them (see [`HttpUpdateChannel`](super::http::HttpUpdateChannel)).

use crate::error::Result;
use crate::progress::ProgressFn;
use async_trait::async_trait;

/// What the channel knows about a pending release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release version identifier.
    pub version: String,
    /// Publication date as reported by the channel.
    pub release_date: Option<String>,
    /// Release notes body.
    pub release_notes: Option<String>,
    /// Download size in bytes, if announced ahead of time.
    pub size_hint: Option<u64>,
}

/// A release found by [`UpdateChannel::check_for_update`].
#[async_trait]
pub trait PendingUpdate: Send + Sync {
    /// Release details for the confirmation prompt.
    fn info(&self) -> &ReleaseInfo;

    /// Download the release and install it, reporting transfer progress.
    ///
    /// Either fully succeeds or fails; there is no partial install.
    async fn download_and_install(&self, on_event: &ProgressFn<'_>) -> Result<()>;
}

/// Source of application updates.
#[async_trait]
pub trait UpdateChannel: Send + Sync {
    /// Look for a release different from the running one.
    async fn check_for_update(&self) -> Result<Option<Box<dyn PendingUpdate>>>;
}
