//! Error types for the sync pipelines.

/// Top-level error type for bundle sync and self-update.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport, connection, or non-success status while querying a remote.
    #[error("network error: {0}")]
    Network(String),

    /// Remote answered but the expected version field is missing or unusable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Local version record exists but cannot be parsed.
    #[error("local state unreadable: {0}")]
    LocalStateUnreadable(String),

    /// Streamed content fetch failed. The destination must not be trusted.
    #[error("transfer error: {0}")]
    Transfer(String),

    /// Staging, swapping, or recording the installed content failed.
    #[error("install error: {0}")]
    Install(String),

    /// Relaunching the process after a self-update failed.
    #[error("restart error: {0}")]
    Restart(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SyncError>;
