//! Process relaunch after a self-update.

use crate::error::{Result, SyncError};
use std::convert::Infallible;
use std::process::Command;

/// Replaces the running process with a fresh instance.
pub trait Relauncher: Send + Sync {
    /// Relaunch the application. Does not return on success.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Restart` if the new process cannot be started.
    fn relaunch(&self) -> Result<Infallible>;
}

/// Spawns the current executable with the same arguments, then exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRelauncher;

impl Relauncher for ProcessRelauncher {
    fn relaunch(&self) -> Result<Infallible> {
        let exe = std::env::current_exe().map_err(|e| {
            SyncError::Restart(format!("cannot determine current executable path: {e}"))
        })?;

        Command::new(&exe)
            .args(std::env::args_os().skip(1))
            .spawn()
            .map_err(|e| SyncError::Restart(format!("cannot start {}: {e}", exe.display())))?;

        tracing::info!(exe = %exe.display(), "relaunched; exiting current process");
        std::process::exit(0);
    }
}
