use serde::{Deserialize, Serialize};

/// Counts reported when a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub organized: usize,
    pub folders: usize,
    pub dead: usize,
}

/// Snapshot handed to whoever polls the organizer.
///
/// `done`, `error` and `cancelled` are mutually exclusive terminal states.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub percent: u8,
    pub text: String,
    pub running: bool,
    pub error: Option<String>,
    pub done: bool,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunSummary>,
}

impl ProgressState {
    pub fn is_terminal(&self) -> bool {
        self.done || self.cancelled || self.error.is_some()
    }

    /// One-line summary for a finished run.
    pub fn summary_message(&self) -> Option<String> {
        if !self.done {
            return None;
        }
        let result = self.result.unwrap_or_default();
        let mut message = format!(
            "Organized {} bookmarks into {} folders.",
            result.organized, result.folders
        );
        if result.dead > 0 {
            message.push_str(&format!(" Found {} dead links.", result.dead));
        }
        Some(message)
    }
}
