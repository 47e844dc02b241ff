//! Application self-update.
//!
//! Asks an [`UpdateChannel`] for a release, confirms it with the user
//! through a [`UserPrompt`], lets the channel download and install it, then
//! relaunches through a [`Relauncher`]. The flow never touches concrete
//! updaters; [`HttpUpdateChannel`] is one implementation.

pub mod channel;
pub mod dialog;
pub mod flow;
pub mod http;
pub mod restart;

pub use channel::{PendingUpdate, ReleaseInfo, UpdateChannel};
pub use dialog::{DialogKind, DialogOptions, UserPrompt};
pub use flow::{CheckTrigger, SelfUpdateOutcome, SelfUpdater};
pub use http::{HttpUpdateChannel, current_target};
pub use restart::{ProcessRelauncher, Relauncher};
