use crate::{RunId, RunRequest, RunSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller asked for a new run.
    StartRequested(RunRequest),
    /// Caller asked to stop the active run at its next checkpoint.
    CancelRequested,
    /// Caller asked to clear a finished run back to the idle defaults.
    ResetRequested,
    /// Pipeline reached a stage boundary.
    Progress {
        run_id: RunId,
        percent: u8,
        text: String,
    },
    /// Pipeline finished applying the plan.
    RunCompleted { run_id: RunId, summary: RunSummary },
    /// Pipeline aborted with an error.
    RunFailed { run_id: RunId, message: String },
    /// Pipeline observed cancellation at a checkpoint.
    RunCancelled { run_id: RunId },
}
