use crate::view_model::{ProgressState, RunSummary};

pub type RunId = u64;

pub const CANCELLED_TEXT: &str = "Cancelled";
pub const STARTING_TEXT: &str = "Starting...";
pub const MAX_PERCENT: u8 = 100;

/// Controller-side state for the organizer. The pipeline never touches this
/// directly; it only sends messages that are folded in by `update`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrganizerState {
    progress: ProgressState,
    current_run: Option<RunId>,
    next_run_id: RunId,
}

impl OrganizerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.progress.clone()
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    pub fn is_running(&self) -> bool {
        self.progress.running
    }

    pub(crate) fn begin_run(&mut self) -> RunId {
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.current_run = Some(run_id);
        self.progress = ProgressState {
            text: STARTING_TEXT.to_string(),
            running: true,
            ..ProgressState::default()
        };
        run_id
    }

    /// True when `run_id` is the active run and it has not reached a
    /// terminal state yet.
    pub(crate) fn accepts(&self, run_id: RunId) -> bool {
        self.current_run == Some(run_id) && self.progress.running
    }

    pub(crate) fn apply_progress(&mut self, percent: u8, text: String) {
        self.progress.percent = percent.min(MAX_PERCENT);
        self.progress.text = text;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.progress.cancelled = true;
        self.progress.running = false;
        self.progress.text = CANCELLED_TEXT.to_string();
    }

    pub(crate) fn mark_failed(&mut self, message: String) {
        self.progress.error = Some(message);
        self.progress.running = false;
    }

    pub(crate) fn mark_done(&mut self, summary: RunSummary) {
        self.progress.done = true;
        self.progress.running = false;
        self.progress.result = Some(summary);
    }

    pub(crate) fn reset(&mut self) {
        self.progress = ProgressState::default();
    }
}
