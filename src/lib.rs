//! assetsync: keeps a desktop app's downloaded runtime and its own binary current.
//!
//! Two independent, one-shot pipelines share the same shape:
//! resolve the remote version → compare with what is installed → fetch →
//! install.
//!
//! # Architecture
//!
//! - **[`bundle`]**: registry-tracked runtime bundle (WASM engine and loader),
//!   fetched concurrently into a staging directory and swapped in atomically
//! - **[`selfupdate`]**: confirm-then-install flow over a pluggable update
//!   channel, followed by a relaunch
//! - **[`update`]**: exact-match version decision and the persisted version record
//! - **[`progress`]**: `Started` / `Progress` / `Finished` transfer events

pub mod bundle;
pub mod config;
pub mod dirs;
pub mod error;
pub mod progress;
pub mod selfupdate;
pub mod update;

pub use bundle::{BundleSync, SyncOutcome};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use progress::{ProgressCallback, ProgressFn, TransferEvent, TransferProgress};
pub use selfupdate::{CheckTrigger, SelfUpdateOutcome, SelfUpdater};
pub use update::{UpdatePlan, decide};
