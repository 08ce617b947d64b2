use std::fmt;

use marksort_core::{BookmarkId, PlanCoverage, RootNotFound, RunId, RunSummary};
use thiserror::Error;

use crate::store::StoreError;

/// Pipeline stages in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadTree,
    Validate,
    Categorize,
    Backup,
    CreateFolders,
    CreateDeadLinksFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress {
        run_id: RunId,
        percent: u8,
        text: String,
    },
    RunFinished {
        run_id: RunId,
        result: Result<RunEnd, OrganizeError>,
    },
}

/// How a run that did not fail came to a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Completed(RunOutcome),
    /// Cancellation was observed on entry to `stage`.
    Cancelled { stage: Stage },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Items that could not be moved into the backup folder.
    pub warnings: Vec<MutationWarning>,
    /// How well the model's plans partitioned the valid bookmarks.
    pub coverage: PlanCoverage,
}

/// A single store mutation that failed without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationWarning {
    pub item: BookmarkId,
    pub title: String,
    pub message: String,
}

impl fmt::Display for MutationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to back up {:?} ({}): {}",
            self.title, self.item, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("model request failed: {0}")]
    Network(String),
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
}

/// Everything that aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrganizeError {
    #[error("{0}")]
    Structural(#[from] RootNotFound),
    #[error("No bookmarks found to organize")]
    EmptyInput,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Could not extract JSON from response")]
    Extraction,
    #[error("Unexpected model response: {0}")]
    Schema(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Returned by the batch validator when cancellation is observed between
/// chunks. Partial results are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;
