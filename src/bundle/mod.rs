//! Runtime bundle sync.
//!
//! Resolves the latest published version of a registry package, compares it
//! with the installed version record, and on mismatch fetches every bundle
//! file concurrently into a staging directory, swaps it in, and only then
//! records the new version.

pub mod fetcher;
pub mod install;
pub mod resolver;
pub mod sync;

pub use fetcher::{AssetFetcher, Transfer};
pub use install::{BundleInstaller, StagingDir};
pub use resolver::{RegistryResolver, RemoteVersionInfo, VersionResolver};
pub use sync::{BundleSource, BundleStatus, BundleSync, SyncOutcome};
