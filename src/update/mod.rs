//! Version bookkeeping shared by both update pipelines.
//!
//! [`decision`] compares a local version against a remote one; [`store`]
//! persists the installed version for the runtime bundle.

pub mod decision;
pub mod store;

pub use decision::{UpdatePlan, decide, decide_with};
pub use store::{LocalVersionStore, VersionRecord};
