//! Local vs. remote version comparison.
//!
//! Versions are opaque identifiers compared by exact string equality. There
//! is no ordering: a remote that differs from the local version is always an
//! update, including a "lower" one, so rollbacks published upstream are
//! picked up the same way as releases.

/// Outcome of comparing the installed version against the remote one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePlan<M = ()> {
    /// Local and remote versions are identical.
    UpToDate,
    /// The remote version differs from the local one (or nothing is installed).
    UpdateAvailable {
        /// Version identifier to install.
        remote_version: String,
        /// Pipeline-specific details about the remote release.
        metadata: M,
    },
}

impl<M> UpdatePlan<M> {
    /// Returns `true` for [`UpdatePlan::UpdateAvailable`].
    pub fn is_available(&self) -> bool {
        matches!(self, Self::UpdateAvailable { .. })
    }

    /// Remote version when an update is available.
    pub fn remote_version(&self) -> Option<&str> {
        match self {
            Self::UpToDate => None,
            Self::UpdateAvailable { remote_version, .. } => Some(remote_version),
        }
    }
}

/// Compare versions without attaching metadata.
pub fn decide(local: Option<&str>, remote: &str) -> UpdatePlan {
    decide_with(local, remote, ())
}

/// Compare versions and carry `metadata` along when an update is available.
pub fn decide_with<M>(local: Option<&str>, remote: &str, metadata: M) -> UpdatePlan<M> {
    match local {
        Some(local) if local == remote => UpdatePlan::UpToDate,
        _ => UpdatePlan::UpdateAvailable {
            remote_version: remote.to_owned(),
            metadata,
        },
    }
}
