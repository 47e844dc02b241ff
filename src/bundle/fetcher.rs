//! Streamed downloads of remote content to local files.

use crate::error::{Result, SyncError};
use crate::progress::{ProgressFn, TransferEvent};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One remote file and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Source URL.
    pub url: String,
    /// Destination file path.
    pub dest: PathBuf,
}

/// Streams HTTP response bodies to disk, reporting progress as it goes.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: reqwest::Client,
}

impl AssetFetcher {
    /// Fetcher sharing `client`'s connection pool and timeouts.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// Emits `Started` once headers arrive, `Progress` per written chunk, and
    /// `Finished` after the file is flushed and synced. The event's `file` is
    /// the destination's file name.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Transfer` on connection failure, a non-success
    /// status, a body shorter than its `Content-Length`, or a disk write
    /// failure. `dest` may then hold partial content and must be discarded.
    pub async fn fetch(&self, url: &str, dest: &Path, on_event: &ProgressFn<'_>) -> Result<u64> {
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_owned());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::Transfer(format!("request for {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Transfer(format!("{url} returned {status}")));
        }

        let total_bytes = response.content_length();
        on_event(TransferEvent::Started {
            file: file_name.clone(),
            total_bytes,
        });

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            SyncError::Transfer(format!("cannot create {}: {e}", dest.display()))
        })?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| SyncError::Transfer(format!("stream for {url} broke: {e}")))?;
            file.write_all(&chunk).await.map_err(|e| {
                SyncError::Transfer(format!("cannot write {}: {e}", dest.display()))
            })?;
            written += chunk.len() as u64;
            on_event(TransferEvent::Progress {
                file: file_name.clone(),
                chunk_len: chunk.len() as u64,
            });
        }

        if let Some(expected) = total_bytes {
            if written != expected {
                return Err(SyncError::Transfer(format!(
                    "{url} ended after {written} of {expected} bytes"
                )));
            }
        }

        file.flush().await.map_err(|e| {
            SyncError::Transfer(format!("cannot flush {}: {e}", dest.display()))
        })?;
        file.sync_all().await.map_err(|e| {
            SyncError::Transfer(format!("cannot sync {}: {e}", dest.display()))
        })?;

        tracing::debug!(url, bytes = written, dest = %dest.display(), "transfer complete");
        on_event(TransferEvent::Finished { file: file_name });
        Ok(written)
    }

    /// Run every transfer concurrently; succeed only if all of them do.
    ///
    /// The first failure is returned and the remaining transfers are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first `SyncError::Transfer` raised by any transfer.
    pub async fn fetch_all(&self, transfers: &[Transfer], on_event: &ProgressFn<'_>) -> Result<u64> {
        let sizes = futures_util::future::try_join_all(
            transfers
                .iter()
                .map(|t| self.fetch(&t.url, &t.dest, on_event)),
        )
        .await?;
        Ok(sizes.into_iter().sum())
    }
}
