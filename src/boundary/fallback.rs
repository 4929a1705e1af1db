use serde::Serialize;

/// The only action offered once a boundary has faulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Full reload of the page/process, not a soft reset
    Reload,
}

/// Fixed view shown by an errored boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackView {
    pub title: &'static str,
    pub message: &'static str,
    pub action_label: &'static str,
    pub action: RecoveryAction,
}

impl FallbackView {
    pub const fn standard() -> Self {
        Self {
            title: "Oops! Something went wrong",
            message: "An unexpected error occurred. Try reloading the page.",
            action_label: "Reload Page",
            action: RecoveryAction::Reload,
        }
    }
}

impl Default for FallbackView {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rendering host capable of a full reload
pub trait ReloadHost: Send + Sync {
    fn reload(&self);
}
