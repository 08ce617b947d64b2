use std::fmt;

use crate::RunId;

/// Parameters of one organization run.
#[derive(Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub credential: String,
    pub max_folders: Option<u32>,
    pub validate_urls: bool,
}

// Keeps the credential out of logs.
impl fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunRequest")
            .field("credential", &"<redacted>")
            .field("max_folders", &self.max_folders)
            .field("validate_urls", &self.validate_urls)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRun { run_id: RunId, request: RunRequest },
    CancelRun { run_id: RunId },
}
