//! Transfer progress events.
//!
//! Provides callback-based progress reporting that decouples the fetch logic
//! from presentation (CLI indicatif bars, an app's own dialog).
//!
//! Each transfer emits, in order: at most one [`TransferEvent::Started`],
//! zero or more [`TransferEvent::Progress`], and exactly one
//! [`TransferEvent::Finished`] when it succeeds. A failed transfer never
//! emits `Finished`.

/// Progress events emitted while streaming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// Response headers arrived; no body bytes have been written yet.
    Started {
        /// File being transferred.
        file: String,
        /// Total size in bytes, if the remote announced it.
        total_bytes: Option<u64>,
    },

    /// A chunk was written to the destination.
    Progress {
        /// File being transferred.
        file: String,
        /// Bytes in this chunk.
        chunk_len: u64,
    },

    /// The transfer completed and the destination is durable.
    Finished {
        /// File that finished.
        file: String,
    },
}

impl TransferEvent {
    /// File the event refers to.
    pub fn file(&self) -> &str {
        match self {
            Self::Started { file, .. } | Self::Progress { file, .. } | Self::Finished { file } => {
                file
            }
        }
    }
}

/// Borrowed progress sink passed down the fetch path. The closure may borrow
/// from the caller's stack for `'a`.
pub type ProgressFn<'a> = dyn Fn(TransferEvent) + Send + Sync + 'a;

/// Owned progress callback.
pub type ProgressCallback = Box<ProgressFn<'static>>;

/// Cumulative progress of a single transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes written so far.
    pub bytes_transferred: u64,
    /// Total size in bytes, if known.
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    /// Fold one event into the running totals.
    pub fn apply(&mut self, event: &TransferEvent) {
        match event {
            TransferEvent::Started { total_bytes, .. } => {
                self.total_bytes = *total_bytes;
            }
            TransferEvent::Progress { chunk_len, .. } => {
                self.bytes_transferred = self.bytes_transferred.saturating_add(*chunk_len);
            }
            TransferEvent::Finished { .. } => {}
        }
    }

    /// Completed fraction in `0.0..=1.0`, when the total is known and non-zero.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.bytes_transferred as f64 / total as f64).min(1.0))
            }
            _ => None,
        }
    }
}
