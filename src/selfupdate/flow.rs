//! Check → confirm → download/install → relaunch.

use crate::error::Result;
use crate::progress::{ProgressCallback, TransferEvent, TransferProgress};
use crate::selfupdate::channel::{ReleaseInfo, UpdateChannel};
use crate::selfupdate::dialog::{DialogOptions, UserPrompt};
use crate::selfupdate::restart::Relauncher;
use std::sync::Mutex;

/// Who asked for the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTrigger {
    /// Timer or startup check. Silent when nothing is found.
    Background,
    /// The user clicked "check for updates". Always answers.
    UserInitiated,
}

/// How a self-update check ended without relaunching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfUpdateOutcome {
    /// The channel had nothing newer.
    UpToDate,
    /// An update was offered and the user declined it.
    Declined,
}

/// Runs the self-update flow against injected capabilities.
pub struct SelfUpdater<C, P, L> {
    channel: C,
    prompt: P,
    relauncher: L,
    on_event: Option<ProgressCallback>,
}

impl<C, P, L> SelfUpdater<C, P, L>
where
    C: UpdateChannel,
    P: UserPrompt,
    L: Relauncher,
{
    /// Build an updater with no progress callback.
    pub fn new(channel: C, prompt: P, relauncher: L) -> Self {
        Self {
            channel,
            prompt,
            relauncher,
            on_event: None,
        }
    }

    /// Forward download progress to `callback` as well as the log.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    /// Check for an update and, if the user accepts, install it and relaunch.
    ///
    /// Returns only when no relaunch happens: nothing was found or the user
    /// declined. Declining has no side effects.
    ///
    /// # Errors
    ///
    /// Propagates channel, install, and relaunch errors unchanged.
    pub async fn check_for_app_updates(&self, trigger: CheckTrigger) -> Result<SelfUpdateOutcome> {
        let Some(update) = self.channel.check_for_update().await? else {
            tracing::debug!(?trigger, "no application update available");
            if trigger == CheckTrigger::UserInitiated {
                self.prompt
                    .notify("You are on the latest version.", &DialogOptions::no_update())
                    .await;
            }
            return Ok(SelfUpdateOutcome::UpToDate);
        };

        let info = update.info();
        tracing::info!(
            version = %info.version,
            date = info.release_date.as_deref().unwrap_or("unknown"),
            "found application update"
        );

        let accepted = self
            .prompt
            .ask(&confirmation_text(info), &DialogOptions::update_available())
            .await;
        if !accepted {
            tracing::info!(version = %info.version, "update declined");
            return Ok(SelfUpdateOutcome::Declined);
        }

        let progress = Mutex::new(TransferProgress::default());
        let on_event = |event: TransferEvent| {
            if let Ok(mut p) = progress.lock() {
                p.apply(&event);
                match &event {
                    TransferEvent::Started { total_bytes, .. } => {
                        tracing::info!(total_bytes = ?total_bytes, "update download started");
                    }
                    TransferEvent::Progress { .. } => {
                        tracing::trace!(
                            downloaded = p.bytes_transferred,
                            total = ?p.total_bytes,
                            fraction = ?p.fraction(),
                            "update download progress"
                        );
                    }
                    TransferEvent::Finished { .. } => {
                        tracing::info!(bytes = p.bytes_transferred, "update download finished");
                    }
                }
            }
            if let Some(callback) = &self.on_event {
                callback(event);
            }
        };
        update.download_and_install(&on_event).await?;
        tracing::info!(version = %info.version, "update installed");

        match self.relauncher.relaunch()? {}
    }

    /// [`check_for_app_updates`](Self::check_for_app_updates), telling the
    /// user about any failure before returning it.
    ///
    /// # Errors
    ///
    /// Same as [`check_for_app_updates`](Self::check_for_app_updates).
    pub async fn run(&self, trigger: CheckTrigger) -> Result<SelfUpdateOutcome> {
        match self.check_for_app_updates(trigger).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(error = %e, "application update failed");
                self.prompt
                    .notify(
                        &format!("The update could not be completed.\n\n{e}"),
                        &DialogOptions::update_failed(),
                    )
                    .await;
                Err(e)
            }
        }
    }
}

fn confirmation_text(info: &ReleaseInfo) -> String {
    let mut text = format!("New update {} is available!", info.version);
    if let Some(date) = &info.release_date {
        text.push_str(&format!("\n\nReleased: {date}"));
    }
    text.push_str(&format!(
        "\n\nRelease notes: {}",
        info.release_notes.as_deref().unwrap_or("none")
    ));
    text
}
