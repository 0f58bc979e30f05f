//! Actions that commands return to communicate with the app

use crate::domain::RowId;

/// Actions returned by commands to communicate state changes
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action needed
    None,

    /// Show notification in the toast line
    Notify(String, NotifyLevel),

    /// Open an input prompt
    OpenPrompt(PromptKind),

    /// Open the help overlay
    OpenHelp,

    /// Close current overlay/popup
    CloseOverlay,

    /// Request quit
    Quit,
}

impl Action {
    pub fn info(text: impl Into<String>) -> Self {
        Action::Notify(text.into(), NotifyLevel::Info)
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Action::Notify(text.into(), NotifyLevel::Warn)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Action::Notify(text.into(), NotifyLevel::Error)
    }
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

/// What an input prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Address(RowId),
    Label(RowId),
    Title,
    ImportFile,
    ImportText,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::Address(_) => "Address",
            PromptKind::Label(_) => "Label",
            PromptKind::Title => "Title",
            PromptKind::ImportFile => "Import file (.xlsx .xls .ods .csv .txt)",
            PromptKind::ImportText => "Import addresses (paste, separated by space/comma/newline)",
        }
    }
}
