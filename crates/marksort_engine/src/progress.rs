use std::sync::mpsc;

use marksort_core::RunId;

use crate::EngineEvent;

/// Receives stage-boundary progress from a running pipeline.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, text: &str);
}

/// Forwards progress as `EngineEvent::Progress` tagged with the run id.
pub struct ChannelProgressSink {
    run_id: RunId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(run_id: RunId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { run_id, tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, percent: u8, text: &str) {
        let _ = self.tx.send(EngineEvent::Progress {
            run_id: self.run_id,
            percent,
            text: text.to_string(),
        });
    }
}

/// Drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _percent: u8, _text: &str) {}
}
