//! User-facing confirmation and notification prompts.

use async_trait::async_trait;

/// Visual severity of a dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogKind {
    /// Neutral information or a question.
    #[default]
    Info,
    /// Something failed.
    Error,
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Presentation options for a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    /// Window title.
    pub title: String,
    /// Severity.
    pub kind: DialogKind,
    /// Accept button label.
    pub ok_label: String,
    /// Decline button label; `None` for notification-only dialogs.
    pub cancel_label: Option<String>,
}

impl DialogOptions {
    /// Accept/decline options for an available update.
    pub fn update_available() -> Self {
        Self {
            title: "Update Available".to_owned(),
            kind: DialogKind::Info,
            ok_label: "Update".to_owned(),
            cancel_label: Some("Cancel".to_owned()),
        }
    }

    /// Acknowledgement options when no update exists.
    pub fn no_update() -> Self {
        Self {
            title: "No Update Available".to_owned(),
            kind: DialogKind::Info,
            ok_label: "OK".to_owned(),
            cancel_label: None,
        }
    }

    /// Acknowledgement options for a failed update.
    pub fn update_failed() -> Self {
        Self {
            title: "Update Failed".to_owned(),
            kind: DialogKind::Error,
            ok_label: "OK".to_owned(),
            cancel_label: None,
        }
    }
}

/// Asks the user questions and shows them messages.
///
/// Both calls wait for the user with no timeout.
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Ask a yes/no question; `true` means accepted.
    async fn ask(&self, question: &str, options: &DialogOptions) -> bool;

    /// Show a message and wait for it to be acknowledged.
    async fn notify(&self, message: &str, options: &DialogOptions);
}
